//! Wire types for the remote vector store and embedding endpoints.
//!
//! These structs mirror the remote JSON shapes exactly. Field names are
//! camelCase on the wire; optional payload keys are omitted entirely rather
//! than serialized as null, because the store distinguishes a missing
//! `filter` from an empty filter object.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved metadata key holding the logical collection name.
pub const METADATA_MODEL: &str = "model";

/// Reserved metadata key holding the record's native identifier.
pub const METADATA_KEY: &str = "key";

/// A scalar metadata value: string, number, or boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Metadata mapping attached to a document or filter.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// The unit sent to the remote store for one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDocument {
    /// Globally unique across all collections sharing one index
    pub id: String,

    /// Must match the index's configured dimensionality
    pub values: Vec<f32>,

    /// Always carries `model` and `key`; never empty
    pub metadata: Metadata,
}

/// One ranked result from a similarity query. Ephemeral; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,

    /// Higher means more similar
    pub score: f64,

    #[serde(default)]
    pub metadata: Metadata,
}

/// Body of the embedding call: a single-element text batch.
#[derive(Debug, Serialize)]
pub struct EmbeddingRequest {
    pub text: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingResponse {
    pub result: EmbeddingResult,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingResult {
    pub data: Vec<Vec<f32>>,
}

/// Body of the batch insert call. One HTTP call regardless of batch size;
/// the caller is responsible for staying under the store's per-request
/// limit.
#[derive(Debug, Serialize)]
pub struct InsertRequest {
    pub vectors: Vec<VectorDocument>,
}

/// Body of the similarity query call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub vector: Vec<f32>,

    pub top_k: usize,

    pub return_metadata: String,

    /// Omitted from the payload when there is no filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub result: QueryResult,
}

#[derive(Debug, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub matches: Vec<VectorMatch>,
}

/// Body of the delete-by-ids call.
#[derive(Debug, Serialize)]
pub struct DeleteRequest {
    pub ids: Vec<String>,
}

/// Similarity metric configured at index creation. Scoring itself is
/// delegated to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    Cosine,
    Euclidean,
    DotProduct,
}

impl SimilarityMetric {
    /// Parse a configured metric name, defaulting to cosine.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "euclidean" => Self::Euclidean,
            "dot_product" => Self::DotProduct,
            _ => Self::Cosine,
        }
    }
}

/// Body of the index creation call.
#[derive(Debug, Serialize)]
pub struct CreateIndexRequest {
    pub name: String,
    pub dimensions: usize,
    pub metric: SimilarityMetric,
}

/// Descriptive information about the physical index.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    #[serde(default)]
    pub vector_count: u64,

    #[serde(default)]
    pub dimension: usize,

    #[serde(default)]
    pub similarity_function: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IndexInfoResponse {
    pub result: IndexInfo,
}

/// One secondary filter index on a named metadata property.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataIndexEntry {
    pub property_name: String,

    #[serde(default)]
    pub index_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMetadataIndexRequest {
    pub property_name: String,
    pub index_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMetadataIndexRequest {
    pub property_name: String,
}

#[derive(Debug, Deserialize)]
pub struct MetadataIndexListResponse {
    #[serde(default)]
    pub result: Vec<MetadataIndexEntry>,
}

/// Error envelope the store attaches to failed calls.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}
