//! Error types for the vector search adapter.
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages. The taxonomy has three
//! families: remote-call failures (the store or embedding endpoint), missing
//! configuration (caught before any remote call), and local validation
//! failures (invariants checked client-side, where the remote call is never
//! attempted).

use thiserror::Error;

/// Failures at the remote HTTP boundary.
///
/// Any non-2xx response or malformed body from the store or the embedding
/// endpoint surfaces as one of these. Nothing here is retried; errors
/// propagate to the caller of the adapter operation that triggered them,
/// which aborts entirely. There is no rollback, so partial remote state is
/// possible after a mid-batch failure.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport-level failure (connect, timeout, TLS, request build)
    #[error("Request failed during {operation}: {source}")]
    Http {
        operation: &'static str,
        source: reqwest::Error,
    },

    /// The remote endpoint answered with a non-success status
    #[error(
        "Remote call failed during {operation} (HTTP {status}): {message}\nSuggestion: Check the store URL, token, and index name in your configuration"
    )]
    RemoteCallFailed {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// The response body did not have the expected shape
    #[error("Malformed response during {operation}: {reason}")]
    MalformedResponse {
        operation: &'static str,
        reason: String,
    },
}

/// Configuration errors, surfaced at the command boundary before any remote
/// call is attempted.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration '{field}'\nSuggestion: {hint}")]
    Missing {
        field: &'static str,
        hint: &'static str,
    },
}

/// Errors from adapter operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A remote call made on behalf of the operation failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The flush sweep hit its iteration cap while the store kept returning
    /// matches. Guards against a pathological store that never converges.
    #[error(
        "Flush sweep for collection '{collection}' exceeded {iterations} iterations without draining\nSuggestion: Check the store's deletion consistency, then re-run the flush"
    )]
    SweepStalled {
        collection: String,
        iterations: usize,
    },
}

/// Errors from operator-facing lifecycle commands.
#[derive(Error, Debug)]
pub enum AdminError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The physical index already holds the maximum number of metadata
    /// indexes; creation is refused locally.
    #[error(
        "Metadata index limit reached: {existing} of {limit} already exist\nSuggestion: Drop an unused metadata index before creating a new one"
    )]
    MetadataIndexCapReached { limit: usize, existing: usize },

    /// A metadata index for this property already exists.
    #[error("A metadata index for property '{property}' already exists")]
    DuplicateMetadataIndex { property: String },

    /// The operator's typed confirmation did not match the expected value.
    #[error("Confirmation did not match '{expected}'; aborting")]
    ConfirmationMismatch { expected: String },

    /// An index with the configured name already exists.
    #[error("Index '{name}' already exists")]
    IndexAlreadyExists { name: String },
}

impl EngineError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Store(e) => e.status_code(),
            Self::SweepStalled { .. } => "SWEEP_STALLED",
        }
    }
}

impl StoreError {
    /// Stable status code, see [`EngineError::status_code`].
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Http { .. } => "REMOTE_UNREACHABLE",
            Self::RemoteCallFailed { .. } => "REMOTE_CALL_FAILED",
            Self::MalformedResponse { .. } => "MALFORMED_RESPONSE",
        }
    }
}

impl AdminError {
    /// Stable status code, see [`EngineError::status_code`].
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Store(e) => e.status_code(),
            Self::Config(_) => "CONFIG_MISSING",
            Self::MetadataIndexCapReached { .. } => "METADATA_INDEX_CAP",
            Self::DuplicateMetadataIndex { .. } => "DUPLICATE_METADATA_INDEX",
            Self::ConfirmationMismatch { .. } => "CONFIRMATION_MISMATCH",
            Self::IndexAlreadyExists { .. } => "INDEX_EXISTS",
        }
    }
}

/// Result type alias for store client operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for adapter operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type alias for configuration checks
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for lifecycle commands
pub type AdminResult<T> = Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_are_stable() {
        let err = StoreError::RemoteCallFailed {
            operation: "query",
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.status_code(), "REMOTE_CALL_FAILED");

        let err = EngineError::SweepStalled {
            collection: "App_Models_Product".to_string(),
            iterations: 1000,
        };
        assert_eq!(err.status_code(), "SWEEP_STALLED");

        let err = AdminError::MetadataIndexCapReached {
            limit: 10,
            existing: 10,
        };
        assert_eq!(err.status_code(), "METADATA_INDEX_CAP");
    }

    #[test]
    fn store_error_wraps_into_engine_error() {
        let store_err = StoreError::MalformedResponse {
            operation: "embed",
            reason: "missing result.data".to_string(),
        };
        let engine_err: EngineError = store_err.into();
        assert_eq!(engine_err.status_code(), "MALFORMED_RESPONSE");
    }

    #[test]
    fn messages_carry_upstream_detail() {
        let err = StoreError::RemoteCallFailed {
            operation: "insert",
            status: 422,
            message: "vector dimension mismatch".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("insert"));
        assert!(rendered.contains("422"));
        assert!(rendered.contains("vector dimension mismatch"));
    }
}
