//! Error types for Training Digest

use thiserror::Error;

/// Errors that can occur while building a digest
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse {file}: {source}")]
    ParseError {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No download folders found in {0}")]
    NoDownloadFolders(String),

    #[error("Missing export file: {0}")]
    MissingFile(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
