//! HTTP client for the remote vector store and embedding endpoints.
//!
//! Each operation is one synchronous request/response pair: no retries, no
//! client-side batching, no session state beyond standard HTTP keep-alive.
//! Remote failures surface as [`StoreError`] values carrying the upstream
//! status and the upstream `errors` array when the body provides one.

use crate::config::Settings;
use crate::error::{StoreError, StoreResult};
use crate::store::types::{
    CreateIndexRequest, CreateMetadataIndexRequest, DeleteMetadataIndexRequest, DeleteRequest,
    EmbeddingRequest, EmbeddingResponse, ErrorResponse, IndexInfo, IndexInfoResponse,
    InsertRequest, Metadata, MetadataIndexEntry, MetadataIndexListResponse, QueryRequest,
    QueryResponse, SimilarityMetric, VectorDocument, VectorMatch,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// Metadata detail level requested from similarity queries.
const RETURN_METADATA: &str = "all";

/// The data-path operations the search engine needs from a vector store.
///
/// Sitting a trait at this seam keeps the engine testable against a scripted
/// in-memory store; the HTTP client below is the production implementation.
pub trait VectorStore {
    /// Generate an embedding for one text via the remote inference endpoint.
    fn generate_embedding(&self, text: &str) -> StoreResult<Vec<f32>>;

    /// Upsert a batch of documents in one call. The caller must stay under
    /// the store's per-request batch limit.
    fn insert_vectors(&self, vectors: &[VectorDocument]) -> StoreResult<()>;

    /// Run a similarity query. `filter` is omitted from the payload
    /// entirely when `None`.
    fn query_vectors(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&Metadata>,
    ) -> StoreResult<Vec<VectorMatch>>;

    /// Delete documents by id in one call.
    fn delete_vectors(&self, ids: &[String]) -> StoreResult<()>;
}

/// Index and metadata-index lifecycle operations, used by the operator
/// commands. Separate from [`VectorStore`] because the engine's data path
/// never touches index lifecycle.
pub trait IndexAdmin {
    /// Name of the physical index this client is scoped to.
    fn index_name(&self) -> &str;

    /// Fetch descriptive information about the index.
    fn get_index_info(&self) -> StoreResult<IndexInfo>;

    /// Whether the index exists. An HTTP 404 is a normal `false`, not an
    /// error.
    fn index_exists(&self) -> StoreResult<bool>;

    /// Create the physical index.
    fn create_index(
        &self,
        name: &str,
        dimensions: usize,
        metric: SimilarityMetric,
    ) -> StoreResult<()>;

    /// Delete the physical index and every vector in it.
    fn delete_index(&self) -> StoreResult<()>;

    /// Create a secondary equality-filter index on one metadata property.
    fn create_metadata_index(&self, property: &str, index_type: &str) -> StoreResult<()>;

    /// Delete the metadata index for one property.
    fn delete_metadata_index(&self, property: &str) -> StoreResult<()>;

    /// List the existing metadata indexes.
    fn list_metadata_indexes(&self) -> StoreResult<Vec<MetadataIndexEntry>>;
}

/// Blocking HTTP client for the remote store.
///
/// Construction is cheap; the client holds only the connection pool, the
/// resolved endpoint URLs, and the bearer token.
pub struct HttpVectorClient {
    http: Client,
    base_url: String,
    token: String,
    index: String,
    embedding_model: String,
}

impl std::fmt::Debug for HttpVectorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpVectorClient")
            .field("base_url", &self.base_url)
            .field("index", &self.index)
            .field("embedding_model", &self.embedding_model)
            .finish_non_exhaustive()
    }
}

impl HttpVectorClient {
    /// Create a client from validated settings.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(settings: &Settings) -> StoreResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.store.timeout_secs))
            .build()
            .map_err(|e| StoreError::Http {
                operation: "client init",
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: settings.store.url.trim_end_matches('/').to_string(),
            token: settings.store.token.clone(),
            index: settings.store.index.clone(),
            embedding_model: settings.embedding.model.clone(),
        })
    }

    fn index_url(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            format!("{}/indexes/{}", self.base_url, self.index)
        } else {
            format!("{}/indexes/{}/{}", self.base_url, self.index, suffix)
        }
    }

    fn post_json<B: serde::Serialize>(
        &self,
        operation: &'static str,
        url: &str,
        body: &B,
    ) -> StoreResult<Response> {
        debug!(operation, url, "vector store request");
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .map_err(|e| StoreError::Http { operation, source: e })?;
        Self::check_status(operation, response)
    }

    fn get(&self, operation: &'static str, url: &str) -> StoreResult<Response> {
        debug!(operation, url, "vector store request");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| StoreError::Http { operation, source: e })?;
        Self::check_status(operation, response)
    }

    /// Reject non-2xx responses, folding the upstream `errors` array into
    /// the error message when the body carries one.
    fn check_status(operation: &'static str, response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let message = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join("; "),
            _ if !body.is_empty() => body,
            _ => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };

        Err(StoreError::RemoteCallFailed {
            operation,
            status: status.as_u16(),
            message,
        })
    }

    fn parse_body<T: serde::de::DeserializeOwned>(
        operation: &'static str,
        response: Response,
    ) -> StoreResult<T> {
        response
            .json()
            .map_err(|e| StoreError::MalformedResponse {
                operation,
                reason: e.to_string(),
            })
    }
}

impl IndexAdmin for HttpVectorClient {
    fn index_name(&self) -> &str {
        &self.index
    }

    fn get_index_info(&self) -> StoreResult<IndexInfo> {
        let response = self.get("index info", &self.index_url(""))?;
        let parsed: IndexInfoResponse = Self::parse_body("index info", response)?;
        Ok(parsed.result)
    }

    fn index_exists(&self) -> StoreResult<bool> {
        match self.get("index info", &self.index_url("")) {
            Ok(_) => Ok(true),
            Err(StoreError::RemoteCallFailed { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn create_index(
        &self,
        name: &str,
        dimensions: usize,
        metric: SimilarityMetric,
    ) -> StoreResult<()> {
        let url = format!("{}/indexes", self.base_url);
        let body = CreateIndexRequest {
            name: name.to_string(),
            dimensions,
            metric,
        };
        self.post_json("index create", &url, &body)?;
        Ok(())
    }

    fn delete_index(&self) -> StoreResult<()> {
        let url = self.index_url("");
        debug!(operation = "index delete", url, "vector store request");
        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| StoreError::Http {
                operation: "index delete",
                source: e,
            })?;
        Self::check_status("index delete", response)?;
        Ok(())
    }

    fn create_metadata_index(&self, property: &str, index_type: &str) -> StoreResult<()> {
        let body = CreateMetadataIndexRequest {
            property_name: property.to_string(),
            index_type: index_type.to_string(),
        };
        self.post_json(
            "metadata index create",
            &self.index_url("metadata_index/create"),
            &body,
        )?;
        Ok(())
    }

    fn delete_metadata_index(&self, property: &str) -> StoreResult<()> {
        let body = DeleteMetadataIndexRequest {
            property_name: property.to_string(),
        };
        self.post_json(
            "metadata index delete",
            &self.index_url("metadata_index/delete"),
            &body,
        )?;
        Ok(())
    }

    fn list_metadata_indexes(&self) -> StoreResult<Vec<MetadataIndexEntry>> {
        let response = self.get(
            "metadata index list",
            &self.index_url("metadata_index/list"),
        )?;
        let parsed: MetadataIndexListResponse =
            Self::parse_body("metadata index list", response)?;
        Ok(parsed.result)
    }
}

impl VectorStore for HttpVectorClient {
    fn generate_embedding(&self, text: &str) -> StoreResult<Vec<f32>> {
        let url = format!("{}/embeddings/{}", self.base_url, self.embedding_model);
        let body = EmbeddingRequest {
            text: vec![text.to_string()],
        };
        let response = self.post_json("embedding", &url, &body)?;
        let parsed: EmbeddingResponse = Self::parse_body("embedding", response)?;

        parsed
            .result
            .data
            .into_iter()
            .next()
            .ok_or(StoreError::MalformedResponse {
                operation: "embedding",
                reason: "response carried no embedding data".to_string(),
            })
    }

    fn insert_vectors(&self, vectors: &[VectorDocument]) -> StoreResult<()> {
        let body = InsertRequest {
            vectors: vectors.to_vec(),
        };
        self.post_json("insert", &self.index_url("upsert"), &body)?;
        Ok(())
    }

    fn query_vectors(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&Metadata>,
    ) -> StoreResult<Vec<VectorMatch>> {
        let body = QueryRequest {
            vector: vector.to_vec(),
            top_k,
            return_metadata: RETURN_METADATA.to_string(),
            filter: filter.cloned(),
        };
        let response = self.post_json("query", &self.index_url("query"), &body)?;
        let parsed: QueryResponse = Self::parse_body("query", response)?;
        Ok(parsed.result.matches)
    }

    fn delete_vectors(&self, ids: &[String]) -> StoreResult<()> {
        let body = DeleteRequest { ids: ids.to_vec() };
        self.post_json("delete", &self.index_url("delete_by_ids"), &body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> HttpVectorClient {
        let mut settings = Settings::default();
        settings.store.url = "https://vectors.example.com/".to_string();
        settings.store.token = "tok".to_string();
        settings.store.index = "records".to_string();
        HttpVectorClient::new(&settings).unwrap()
    }

    #[test]
    fn index_urls_are_scoped() {
        let client = test_client();
        assert_eq!(
            client.index_url(""),
            "https://vectors.example.com/indexes/records"
        );
        assert_eq!(
            client.index_url("query"),
            "https://vectors.example.com/indexes/records/query"
        );
        assert_eq!(
            client.index_url("metadata_index/list"),
            "https://vectors.example.com/indexes/records/metadata_index/list"
        );
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let client = test_client();
        assert_eq!(client.base_url, "https://vectors.example.com");
    }
}
