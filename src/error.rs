// src/error.rs
// Standardized error types for symdex

use thiserror::Error;

/// Main error type for the symdex library
#[derive(Error, Debug)]
pub enum SymdexError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error(
        "embedding dimension mismatch: vector table declares {stored}, configuration says {configured}. \
         Fix embeddings.dimensions in .symdex/config.toml or run `symdex index --reembed`."
    )]
    DimensionMismatch { stored: usize, configured: usize },

    #[error("unsupported schema version {found} (this build expects {expected})")]
    SchemaVersion { found: i64, expected: i64 },

    #[error("unknown error: {0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Convenience type alias for Result using SymdexError
pub type Result<T> = std::result::Result<T, SymdexError>;

impl From<String> for SymdexError {
    fn from(s: String) -> Self {
        SymdexError::Other(s)
    }
}

impl From<SymdexError> for String {
    fn from(err: SymdexError) -> Self {
        err.to_string()
    }
}
