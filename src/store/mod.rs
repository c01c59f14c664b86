//! Remote vector store boundary: wire types and the HTTP client.

pub mod client;
pub mod types;

pub use client::{HttpVectorClient, IndexAdmin, VectorStore};
pub use types::{
    IndexInfo, METADATA_KEY, METADATA_MODEL, Metadata, MetadataIndexEntry, MetadataValue,
    SimilarityMetric, VectorDocument, VectorMatch,
};
