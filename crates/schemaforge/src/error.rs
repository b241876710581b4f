//! Error types for the schemaforge library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for schemaforge operations.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Markup that could not be decoded or parsed.
    #[error("Document error: {0}")]
    Document(String),

    /// Failure talking to an LLM provider (transport, auth, rate limit, bad payload).
    #[error("LLM error: {0}")]
    Llm(String),

    /// Persistence failure. Always fatal to a migration run.
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Empty input or nothing to analyze.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for schemaforge operations.
pub type Result<T> = std::result::Result<T, ForgeError>;
