use std::path::PathBuf;
use thiserror::Error;

use crate::generation::GenerationError;
use crate::history::HistoryError;

/// Main error type for the docchat pipeline
#[derive(Error, Debug)]
pub enum DocchatError {
    /// Configuration related errors (missing capability, bad pool, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// Query reformulation failed; surfaced rather than silently skipped,
    /// since skipping the rewrite changes retrieval semantics
    #[error("Query reformulation failed: {0}")]
    Reformulation(#[source] GenerationError),

    /// Answer generation failed
    #[error("Answer generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Conversation history store failed
    #[error("History store error: {0}")]
    History(#[from] HistoryError),

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for docchat operations
pub type Result<T> = std::result::Result<T, DocchatError>;
