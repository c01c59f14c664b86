//! Searchable-record indexing backed by a remote vector-similarity store.
//!
//! The crate adapts an application-level full-text-search contract onto a
//! stateless remote vector store: records are flattened to embeddable text,
//! embedded via a remote inference endpoint, upserted with metadata into a
//! shared vector index, and similarity matches are mapped back into
//! rank-ordered record collections.

pub mod admin;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod record;
pub mod store;

// Explicit exports for better API clarity
pub use config::{EmbeddingModel, Settings};
pub use engine::{QueryOptions, SearchEngine, SearchQuery, SearchResults};
pub use error::{
    AdminError, AdminResult, ConfigError, ConfigResult, EngineError, EngineResult, StoreError,
    StoreResult,
};
pub use record::{FieldMap, FieldValue, RecordKey, Searchable, flatten_field_map, namespaced_id};
pub use store::{
    HttpVectorClient, IndexAdmin, Metadata, MetadataValue, VectorDocument, VectorMatch,
    VectorStore,
};
