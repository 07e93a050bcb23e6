//! Error types for earnings-ai.

use thiserror::Error;

/// Library-level error type.
///
/// There is one variant per external dependency of the pipeline
/// (speech-to-text, extraction tools, embeddings, document store, generation)
/// plus the ambient failures those layers wrap.
#[derive(Error, Debug)]
pub enum EarningsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Document store error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// SQLite failures surface as store failures.
impl From<rusqlite::Error> for EarningsError {
    fn from(e: rusqlite::Error) -> Self {
        EarningsError::Storage(format!("SQLite: {}", e))
    }
}

/// Result type alias for earnings-ai operations.
pub type Result<T> = std::result::Result<T, EarningsError>;
