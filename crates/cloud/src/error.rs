//! Error types for catalog queries and scene discovery.

use forcesar_core::Repository;
use thiserror::Error;

/// Errors produced while querying catalogs.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed {repository} response: {reason}")]
    MalformedResponse {
        repository: Repository,
        reason: String,
    },

    #[error("{repository} query failed [{filters}]: {source}")]
    Query {
        repository: Repository,
        filters: String,
        source: Box<CatalogError>,
    },

    #[error("discovery shard for relative orbit {orbit} failed: {source}")]
    Shard {
        orbit: u32,
        source: Box<CatalogError>,
    },
}

impl CatalogError {
    /// Relative orbit of the failing shard, if this came from a sharded discovery.
    pub fn failed_orbit(&self) -> Option<u32> {
        match self {
            Self::Shard { orbit, .. } => Some(*orbit),
            _ => None,
        }
    }
}

/// Result alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
