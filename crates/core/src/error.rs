//! Error types for the docqa domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each pipeline stage has its own error enum; none of them are retried
//! inside the core, the orchestrating layer decides.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all docqa operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Ingestion ---
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    // --- Vector store ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Answering ---
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Wire-level failures talking to an LLM or embedding endpoint.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// A document could not be turned into a structured [`crate::Document`].
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Unsupported document format: {}", path.display())]
    Unsupported { path: PathBuf },

    #[error("Failed to read {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("Failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding count mismatch: sent {expected} texts, got {actual} vectors")]
    CountMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Schema mismatch for table '{table}': vector dimension is {expected}, embedder produces {actual}")]
    SchemaMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("Connection is not initialized or already closed")]
    NotInitialized,

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// The chat model failed before or during streaming an answer.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Chat request failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Stream failed after {received} chars: {reason}")]
    Interrupted { received: usize, reason: String },
}
