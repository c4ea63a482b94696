//! Pipeline configuration
//!
//! Loaded once from a JSON file and passed explicitly at construction.
//! Every field has a default, so `{}` is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::enrichment::Vocabulary;
use crate::observability::Event;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration could not be read or is invalid
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        "NLQ_CONFIG_ERROR"
    }

    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_sqlite_path() -> PathBuf {
    PathBuf::from("sample.db")
}
fn default_root_collection() -> String {
    "orders".to_string()
}

/// Generator endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Chat-completions URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Bearer token; empty means unauthenticated
    #[serde(default)]
    pub api_key: String,

    /// Upper bound on one generator call (default: 30s)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub temperature: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: String::new(),
            timeout_ms: default_timeout_ms(),
            temperature: 0.0,
        }
    }
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// SQLite backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteConfig {
    #[serde(default = "default_sqlite_path")]
    pub path: PathBuf,
    /// Open sessions with `SQLITE_OPEN_READ_ONLY`
    #[serde(default)]
    pub read_only: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: default_sqlite_path(),
            read_only: false,
        }
    }
}

/// Document backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Collection a bare aggregation pipeline runs against
    #[serde(default = "default_root_collection")]
    pub root_collection: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            root_collection: default_root_collection(),
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub sqlite: SqliteConfig,
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub vocabulary: Vocabulary,
}

impl PipelineConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json(&content)?;
        info!(event = %Event::ConfigLoaded, path = %path.display(), model = %config.generator.model, "configuration loaded");
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: PipelineConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.generator.endpoint.trim().is_empty() {
            return Err(ConfigError::invalid("generator.endpoint", "must not be empty"));
        }
        if self.generator.model.trim().is_empty() {
            return Err(ConfigError::invalid("generator.model", "must not be empty"));
        }
        if self.generator.timeout_ms == 0 {
            return Err(ConfigError::invalid("generator.timeout_ms", "must be > 0"));
        }
        if !(0.0..=2.0).contains(&self.generator.temperature) {
            return Err(ConfigError::invalid(
                "generator.temperature",
                format!("{} is outside 0.0..=2.0", self.generator.temperature),
            ));
        }
        if self.sqlite.path.as_os_str().is_empty() {
            return Err(ConfigError::invalid("sqlite.path", "must not be empty"));
        }
        if self.document.root_collection.trim().is_empty() {
            return Err(ConfigError::invalid("document.root_collection", "must not be empty"));
        }
        Ok(())
    }
}
