//! Error types for Ragbook.

use thiserror::Error;

/// Library-level error type for Ragbook operations.
#[derive(Error, Debug)]
pub enum RagbookError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl RagbookError {
    /// Whether this error was caused by the caller rather than a collaborator.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, RagbookError::InvalidParameter(_) | RagbookError::SourceNotFound(_))
    }
}

/// Result type alias for Ragbook operations.
pub type Result<T> = std::result::Result<T, RagbookError>;
