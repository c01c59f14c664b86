//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - operation completed
//! - `1`: General error - unspecified failure
//! - `2`: Blocking error - critical failure that should halt automation
//! - `3-125`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::{AdminError, ConfigError, EngineError, StoreError};

/// Standard exit codes for CLI operations.
///
/// These codes follow Unix conventions where 0 indicates success,
/// and non-zero values indicate various error conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Critical error that should halt automation (code 2)
    BlockingError = 2,

    /// Remote endpoint rejected or failed the call (code 3)
    RemoteError = 3,

    /// Configuration missing or invalid (code 4)
    ConfigError = 4,

    /// Local validation refused the operation (code 5)
    ValidationError = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// Map an engine error to its exit code.
    pub fn from_engine_error(error: &EngineError) -> Self {
        match error {
            EngineError::Store(e) => Self::from_store_error(e),
            // A non-converging sweep leaves remote state behind; halt
            // automation rather than continue against it
            EngineError::SweepStalled { .. } => ExitCode::BlockingError,
        }
    }

    /// Map a store error to its exit code.
    pub fn from_store_error(error: &StoreError) -> Self {
        match error {
            StoreError::Http { .. }
            | StoreError::RemoteCallFailed { .. }
            | StoreError::MalformedResponse { .. } => ExitCode::RemoteError,
        }
    }

    /// Map an admin error to its exit code.
    pub fn from_admin_error(error: &AdminError) -> Self {
        match error {
            AdminError::Store(e) => Self::from_store_error(e),
            AdminError::Config(ConfigError::Missing { .. }) => ExitCode::ConfigError,
            AdminError::MetadataIndexCapReached { .. }
            | AdminError::DuplicateMetadataIndex { .. }
            | AdminError::ConfirmationMismatch { .. }
            | AdminError::IndexAlreadyExists { .. } => ExitCode::ValidationError,
        }
    }

    /// Check if this exit code indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::BlockingError => "Blocking error - automation should halt",
            ExitCode::RemoteError => "Remote call failed",
            ExitCode::ConfigError => "Configuration error",
            ExitCode::ValidationError => "Validation refused the operation",
        }
    }
}
