//! Configuration module for the vector search adapter.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `SCOUTVEC_` and use double
//! underscores to separate nested levels:
//! - `SCOUTVEC_STORE__URL=https://...` sets `store.url`
//! - `SCOUTVEC_STORE__TOKEN=...` sets `store.token`
//! - `SCOUTVEC_EMBEDDING__MODEL=large` sets `embedding.model`
//!
//! Configuration is constructed once and passed by reference into the store
//! client and the operator commands. Nothing in the library reads ambient
//! state after load.

use crate::error::{ConfigError, ConfigResult};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Remote vector store connection settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Embedding endpoint settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Search behavior settings
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    /// Base URL of the vector store REST endpoint
    #[serde(default)]
    pub url: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub token: String,

    /// Name of the physical vector index shared by all collections
    #[serde(default = "default_index_name")]
    pub index: String,

    /// Per-call timeout in seconds (connect + read)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// Embedding model served by the remote endpoint: "small", "base", or
    /// "large". Unrecognized names fall back to the base dimensionality.
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    /// Default number of results when the caller does not specify a limit
    #[serde(default = "default_result_limit")]
    pub default_limit: usize,

    /// Similarity metric used when creating the index
    #[serde(default = "default_metric")]
    pub metric: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_false() -> bool {
    false
}
fn default_index_name() -> String {
    "records".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_embedding_model() -> String {
    "base".to_string()
}
fn default_result_limit() -> usize {
    10
}
fn default_metric() -> String {
    "cosine".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            store: StoreConfig::default(),
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: String::new(),
            index: default_index_name(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_result_limit(),
            metric: default_metric(),
        }
    }
}

/// Vector dimensionality produced by each supported embedding model.
///
/// The remote store's index must be created with a matching dimension, and
/// the flush sweep needs the dimension to build its zero-filled probe
/// vector without calling the embedding endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingModel {
    /// 384-dimensional embeddings
    Small,
    /// 768-dimensional embeddings
    Base,
    /// 1024-dimensional embeddings
    Large,
}

impl EmbeddingModel {
    /// Resolve a configured model name. Unknown names map to `Base`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "small" => Self::Small,
            "base" => Self::Base,
            "large" => Self::Large,
            _ => Self::Base,
        }
    }

    /// Dimensionality of vectors produced by this model.
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        match self {
            Self::Small => 384,
            Self::Base => 768,
            Self::Large => 1024,
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".scoutvec/settings.toml"));

        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Layer in environment variables with SCOUTVEC_ prefix.
            // Double underscore separates nested levels; single underscores
            // stay as-is within field names.
            .merge(Env::prefixed("SCOUTVEC_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SCOUTVEC_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the workspace root by looking for a .scoutvec directory,
    /// searching from the current directory up to root.
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".scoutvec");
            if config_dir.exists() && config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<(), String> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".scoutvec/settings.toml"));

        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                if let Err(e) = toml::from_str::<Settings>(&content) {
                    return Err(format!(
                        "Configuration file is corrupted: {e}\nRun 'scoutvec init --force' to regenerate."
                    ));
                }
            }
            Err(e) => {
                return Err(format!("Cannot read configuration file: {e}"));
            }
        }

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(".scoutvec/settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = r#"# Scoutvec Configuration File
# https://github.com/bartolli/scoutvec

# Version of the configuration schema
version = 1

# Global debug mode
debug = false

[store]
# Base URL of the vector store REST endpoint
url = ""

# Bearer token sent with every request.
# Prefer SCOUTVEC_STORE__TOKEN over committing the token here.
token = ""

# Name of the physical vector index shared by all collections
index = "records"

# Per-call timeout in seconds
timeout_secs = 30

[embedding]
# Embedding model served by the remote endpoint: "small" (384 dims),
# "base" (768 dims), or "large" (1024 dims)
model = "base"

[search]
# Default number of results when the caller does not specify a limit
default_limit = 10

# Similarity metric used when creating the index
metric = "cosine"
"#;

        std::fs::write(&config_path, template)?;

        Ok(config_path)
    }

    /// Validate that the settings required for remote calls are present.
    ///
    /// Surfaced at the command boundary before any remote call is attempted,
    /// so a missing credential never turns into an opaque HTTP failure.
    pub fn require_store(&self) -> ConfigResult<()> {
        if self.store.url.is_empty() {
            return Err(ConfigError::Missing {
                field: "store.url",
                hint: "Set it in .scoutvec/settings.toml or via SCOUTVEC_STORE__URL",
            });
        }
        if self.store.token.is_empty() {
            return Err(ConfigError::Missing {
                field: "store.token",
                hint: "Set it in .scoutvec/settings.toml or via SCOUTVEC_STORE__TOKEN",
            });
        }
        if self.store.index.is_empty() {
            return Err(ConfigError::Missing {
                field: "store.index",
                hint: "Set it in .scoutvec/settings.toml or via SCOUTVEC_STORE__INDEX",
            });
        }
        Ok(())
    }

    /// Resolved embedding model for this configuration.
    #[must_use]
    pub fn embedding_model(&self) -> EmbeddingModel {
        EmbeddingModel::from_name(&self.embedding.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_complete() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert!(!settings.debug);
        assert_eq!(settings.store.index, "records");
        assert_eq!(settings.store.timeout_secs, 30);
        assert_eq!(settings.embedding.model, "base");
        assert_eq!(settings.search.default_limit, 10);
        assert_eq!(settings.search.metric, "cosine");
    }

    #[test]
    fn model_dimension_lookup() {
        assert_eq!(EmbeddingModel::from_name("small").dimensions(), 384);
        assert_eq!(EmbeddingModel::from_name("base").dimensions(), 768);
        assert_eq!(EmbeddingModel::from_name("large").dimensions(), 1024);
        // Unknown model names fall back to the base dimensionality
        assert_eq!(EmbeddingModel::from_name("mystery").dimensions(), 768);
        assert_eq!(EmbeddingModel::from_name("").dimensions(), 768);
    }

    #[test]
    fn require_store_reports_first_missing_field() {
        let mut settings = Settings::default();
        let err = settings.require_store().unwrap_err();
        assert!(err.to_string().contains("store.url"));

        settings.store.url = "https://example.upstash.io".to_string();
        let err = settings.require_store().unwrap_err();
        assert!(err.to_string().contains("store.token"));

        settings.store.token = "secret".to_string();
        assert!(settings.require_store().is_ok());
    }

    #[test]
    fn settings_roundtrip_through_toml() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.store.index, settings.store.index);
        assert_eq!(parsed.embedding.model, settings.embedding.model);
    }

    #[test]
    fn load_from_reads_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
[store]
url = "https://vectors.example.com"
token = "tok"

[embedding]
model = "large"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.store.url, "https://vectors.example.com");
        assert_eq!(settings.embedding.model, "large");
        // Untouched sections keep their defaults
        assert_eq!(settings.store.index, "records");
        assert_eq!(settings.search.default_limit, 10);
    }
}
