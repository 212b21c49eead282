//! Error types for job construction and dispatch.

use std::time::Duration;

use thiserror::Error;

/// Errors produced while building or running processing jobs.
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },
}

/// Result alias for processing operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;
