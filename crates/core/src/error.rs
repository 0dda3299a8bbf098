//! Error types for the byte-pair encoding library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the tokenizer library.
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// Target vocabulary cannot hold the byte alphabet plus special tokens
    #[error("Vocabulary size {requested} is below the minimum of {minimum} (256 bytes + special tokens)")]
    VocabSizeTooSmall { requested: usize, minimum: usize },

    /// Byte token with no entry in the reverse vocabulary
    #[error("Unknown token: {0}")]
    UnknownToken(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Pre-tokenization pattern failed to compile or to match
    #[error("Pattern error: {0}")]
    Pattern(String),

    /// Error loading vocabulary or merges
    #[error("Load error: {0}")]
    Load(String),

    /// Error saving vocabulary or merges
    #[error("Save error: {0}")]
    Save(String),

    /// I/O error with file context
    #[error("I/O error for {path}: {err}")]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TokenizerError {
    /// Build an `UnknownToken` error from raw token bytes.
    pub fn unknown_bytes(bytes: &[u8]) -> Self {
        TokenizerError::UnknownToken(format!("b\"{}\"", bytes.escape_ascii()))
    }
}

/// Result type alias for tokenizer operations.
pub type Result<T> = std::result::Result<T, TokenizerError>;
