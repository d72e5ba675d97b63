//! Configuration management
//!
//! TOML-backed configuration with environment variable overrides
//! (`DOCCHAT_SECTION__KEY=value`) and validation at load time.

use crate::error::{DocchatError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Retrieval channel depths and fusion parameters
///
/// Immutable per retriever instance; a corpus rebuild constructs a fresh
/// retriever rather than mutating these in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Result depth of the lexical (keyword) channel
    pub lexical_k: usize,
    /// Result depth of the vector (semantic) channel
    pub vector_k: usize,
    /// RRF smoothing constant; dampens the advantage of rank-1 results
    pub fusion_k: f64,
    /// Maximum number of fused results
    pub fused_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            lexical_k: 4,
            vector_k: 4,
            fusion_k: 60.0,
            fused_top_k: 6,
        }
    }
}

/// HNSW vector index parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Construction beam width (higher = better recall, slower build)
    pub hnsw_ef_construction: usize,
    /// Number of connections per layer
    pub hnsw_m: usize,
    /// Search beam width
    pub hnsw_ef_search: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            hnsw_ef_construction: 200,
            hnsw_m: 16,
            hnsw_ef_search: 50,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name (e.g. "all-MiniLM-L6-v2")
    pub model: String,
    /// Batch size for corpus embedding
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".to_string(),
            batch_size: 32,
        }
    }
}

/// Generation capability configuration, handed to provider implementations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.0,
        }
    }
}

/// Conversation history storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// SQLite database path; absent means in-memory fallback
    /// (history lost on restart - acceptable, documented)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file, apply env overrides, and validate
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DocchatError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| DocchatError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DocchatError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", parent),
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| DocchatError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: DOCCHAT_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("DOCCHAT_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        fn parse<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
            value.parse().map_err(|_| DocchatError::InvalidConfigValue {
                path: path.to_string(),
                message: format!("Cannot parse '{}'", value),
            })
        }

        match path {
            "RETRIEVAL__LEXICAL_K" => self.retrieval.lexical_k = parse(path, value)?,
            "RETRIEVAL__VECTOR_K" => self.retrieval.vector_k = parse(path, value)?,
            "RETRIEVAL__FUSION_K" => self.retrieval.fusion_k = parse(path, value)?,
            "RETRIEVAL__FUSED_TOP_K" => self.retrieval.fused_top_k = parse(path, value)?,
            "INDEX__HNSW_EF_CONSTRUCTION" => {
                self.index.hnsw_ef_construction = parse(path, value)?
            }
            "INDEX__HNSW_M" => self.index.hnsw_m = parse(path, value)?,
            "INDEX__HNSW_EF_SEARCH" => self.index.hnsw_ef_search = parse(path, value)?,
            "EMBEDDING__MODEL" => self.embedding.model = value.to_string(),
            "EMBEDDING__BATCH_SIZE" => self.embedding.batch_size = parse(path, value)?,
            "GENERATION__MODEL" => self.generation.model = value.to_string(),
            "GENERATION__TEMPERATURE" => self.generation.temperature = parse(path, value)?,
            "HISTORY__DATABASE_PATH" => {
                self.history.database_path = Some(PathBuf::from(value));
            }
            _ => {
                tracing::debug!("Unknown config override: {}", path);
            }
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        fn invalid(path: &str, message: impl Into<String>) -> DocchatError {
            DocchatError::InvalidConfigValue {
                path: path.to_string(),
                message: message.into(),
            }
        }

        if self.retrieval.lexical_k == 0 {
            return Err(invalid("retrieval.lexical_k", "must be at least 1"));
        }
        if self.retrieval.vector_k == 0 {
            return Err(invalid("retrieval.vector_k", "must be at least 1"));
        }
        if self.retrieval.fusion_k <= 0.0 {
            return Err(invalid("retrieval.fusion_k", "must be positive"));
        }
        if self.retrieval.fused_top_k == 0 {
            return Err(invalid("retrieval.fused_top_k", "must be at least 1"));
        }
        if self.index.hnsw_m == 0 {
            return Err(invalid("index.hnsw_m", "must be at least 1"));
        }
        if self.index.hnsw_ef_search == 0 {
            return Err(invalid("index.hnsw_ef_search", "must be at least 1"));
        }
        if self.embedding.batch_size == 0 {
            return Err(invalid("embedding.batch_size", "must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(invalid("generation.temperature", "must be within [0, 2]"));
        }

        Ok(())
    }

    /// Default config file location (`~/.config/docchat/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("docchat").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.fusion_k, 60.0);
        assert_eq!(config.retrieval.fused_top_k, 6);
        assert!(config.history.database_path.is_none());
    }

    #[test]
    fn test_validation_rejects_zero_top_k() {
        let mut config = Config::default();
        config.retrieval.fused_top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_nonpositive_fusion_k() {
        let mut config = Config::default();
        config.retrieval.fusion_k = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let mut config = Config::default();
        config.retrieval.fused_top_k = 8;
        config.history.database_path = Some(temp.path().join("history.db"));
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.retrieval.fused_top_k, 8);
        assert_eq!(loaded.history.database_path, config.history.database_path);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(DocchatError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_env_override_parsing() {
        let mut config = Config::default();
        config
            .set_value_from_env("RETRIEVAL__FUSED_TOP_K", "12")
            .unwrap();
        assert_eq!(config.retrieval.fused_top_k, 12);

        let result = config.set_value_from_env("RETRIEVAL__FUSED_TOP_K", "notanumber");
        assert!(result.is_err());
    }
}
