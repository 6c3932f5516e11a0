//! Configuration loading, validation, and management for docqa.
//!
//! Loads configuration from `~/.docqa/config.toml` (or an explicit path) with
//! environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.docqa/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the OpenAI-compatible endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Name used in logs for the configured endpoint
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Chat completion settings
    #[serde(default)]
    pub chat: ChatConfig,

    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector store location
    #[serde(default)]
    pub store: StoreConfig,

    /// Document ingestion settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Context retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("chat", &self.chat)
            .field("embedding", &self.embedding)
            .field("store", &self.store)
            .field("ingest", &self.ingest)
            .field("retrieval", &self.retrieval)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Low-to-moderate randomness favours factual consistency
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_chat_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.5
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Output dimension; fixes the vector column of every table created
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Texts per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_dimensions() -> usize {
    1536
}
fn default_batch_size() -> usize {
    64
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file (":memory:" for an ephemeral store)
    #[serde(default = "default_store_path")]
    pub path: String,

    #[serde(default = "default_table")]
    pub table: String,
}

fn default_store_path() -> String {
    "data/docqa.sqlite".into()
}
fn default_table() -> String {
    "docling".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            table: default_table(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory scanned (non-recursively) for *.pdf and *.md
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,

    /// Token budget per chunk
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Merge consecutive undersized chunks under the same headings
    #[serde(default)]
    pub merge_peers: bool,
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}
fn default_max_tokens() -> usize {
    128
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            max_tokens: default_max_tokens(),
            merge_peers: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum search results per query
    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default)]
    pub classifier: ClassifierConfig,
}

fn default_limit() -> usize {
    20
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            classifier: ClassifierConfig::default(),
        }
    }
}

/// Which lines mark a passage as carrying exact parameter values.
///
/// A line qualifies when it contains `separator` and at least one marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Matched case-sensitively
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,

    /// Matched against the lowercased line
    #[serde(default = "default_case_insensitive_markers")]
    pub case_insensitive_markers: Vec<String>,
}

fn default_separator() -> String {
    " = ".into()
}
fn default_markers() -> Vec<String> {
    vec!["tcp_rmem".into(), "tcp_wmem".into()]
}
fn default_case_insensitive_markers() -> Vec<String> {
    vec!["kernel".into()]
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            markers: default_markers(),
            case_insensitive_markers: default_case_insensitive_markers(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl AppConfig {
    /// Load configuration from the default path (~/.docqa/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_at(&Self::config_dir().join("config.toml"))
    }

    /// Load configuration from `path`, then apply environment overrides:
    /// - `DOCQA_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `DOCQA_API_URL`
    /// - `DOCQA_MODEL`
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("DOCQA_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(url) = std::env::var("DOCQA_API_URL") {
            config.api_url = url;
        }

        if let Ok(model) = std::env::var("DOCQA_MODEL") {
            config.chat.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path, without env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docqa")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(ConfigError::ValidationError(
                "chat.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.embedding.dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimensions must be > 0".into(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.batch_size must be > 0".into(),
            ));
        }
        if self.ingest.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.max_tokens must be > 0".into(),
            ));
        }
        if self.retrieval.limit == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.limit must be > 0".into(),
            ));
        }
        if self.store.table.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.table must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            api_url: default_api_url(),
            chat: ChatConfig::default(),
            embedding: EmbeddingConfig::default(),
            store: StoreConfig::default(),
            ingest: IngestConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}
