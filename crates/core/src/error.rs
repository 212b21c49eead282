//! Error types for forcesar

use thiserror::Error;

/// Main error type for forcesar core operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {key} ({reason})")]
    Config { key: String, reason: String },

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Malformed parameter file line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },

    #[error("Geometry conversion failed: {0}")]
    Geometry(String),

    #[error("Invalid scene record: {0}")]
    Record(String),

    #[error("Reference grid error: {0}")]
    Grid(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn config(key: &str, reason: impl Into<String>) -> Self {
        Error::Config {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn geometry(reason: impl Into<String>) -> Self {
        Error::Geometry(reason.into())
    }
}

/// Result type alias for forcesar core operations
pub type Result<T> = std::result::Result<T, Error>;
