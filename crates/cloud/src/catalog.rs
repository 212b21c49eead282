//! Catalog client abstraction.
//!
//! One [`CatalogClient::query`] call issues a single metadata search against
//! one backend and maps the response onto [`SceneRecord`]s. Failures are not
//! retried here; they come back as [`CatalogError::Query`] carrying the
//! repository and the filters that were used.

use std::time::Duration;

use forcesar_core::{Repository, SceneRecord};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::asf::AsfClient;
use crate::error::{CatalogError, Result};
use crate::filters::SearchFilters;
use crate::resto::RestoClient;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration shared by all catalog clients.
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// Per-request timeout (default 120 s).
    pub request_timeout: Duration,
    /// Records requested per page (default 1000).
    pub page_size: u32,
    /// Maximum records collected across pages (default 10 000).
    pub max_items: usize,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(120),
            page_size: 1000,
            max_items: 10_000,
        }
    }
}

impl CatalogOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

// ---------------------------------------------------------------------------
// Client trait
// ---------------------------------------------------------------------------

/// A scene metadata search backend.
#[allow(async_fn_in_trait)]
pub trait CatalogClient {
    /// Repository this client talks to.
    fn repository(&self) -> Repository;

    /// Run one search and return canonical records in backend response order.
    async fn query(&self, filters: &SearchFilters) -> Result<Vec<SceneRecord>>;
}

/// Any of the supported backends, selected at runtime.
pub enum Catalog {
    Resto(RestoClient),
    Asf(AsfClient),
}

impl Catalog {
    /// Create the client for `repository`.
    pub fn connect(repository: Repository, options: CatalogOptions) -> Result<Self> {
        Ok(match repository {
            Repository::CodeDe | Repository::Creodias => {
                Self::Resto(RestoClient::new(repository, options)?)
            }
            Repository::Asf => Self::Asf(AsfClient::new(options)?),
        })
    }
}

impl CatalogClient for Catalog {
    fn repository(&self) -> Repository {
        match self {
            Self::Resto(c) => c.repository(),
            Self::Asf(c) => c.repository(),
        }
    }

    async fn query(&self, filters: &SearchFilters) -> Result<Vec<SceneRecord>> {
        match self {
            Self::Resto(c) => c.query(filters).await,
            Self::Asf(c) => c.query(filters).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub(crate) fn http_client(options: &CatalogOptions) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(options.request_timeout)
        .build()
        .map_err(|e| CatalogError::Network(format!("failed to build HTTP client: {e}")))
}

/// Send a GET and return the body of a successful response.
pub(crate) async fn fetch_text(request: reqwest::RequestBuilder) -> Result<String> {
    let resp = request.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(CatalogError::Network(format!(
            "catalog returned HTTP {}: {}",
            status,
            body.chars().take(500).collect::<String>()
        )));
    }
    resp.text()
        .await
        .map_err(|e| CatalogError::Network(format!("reading response body: {e}")))
}

/// Attach repository and filter context to a failed query.
pub(crate) fn query_failed(
    repository: Repository,
    filters: &SearchFilters,
    err: CatalogError,
) -> CatalogError {
    CatalogError::Query {
        repository,
        filters: filters.to_string(),
        source: Box::new(err),
    }
}

/// Decode one raw feature; a feature that does not fit the model is a record error.
pub(crate) fn decode_feature<T: DeserializeOwned>(raw: serde_json::Value) -> forcesar_core::Result<T> {
    serde_json::from_value(raw)
        .map_err(|e| forcesar_core::Error::Record(format!("unreadable feature: {e}")))
}

/// Keep converted records, logging and dropping the ones that failed.
pub(crate) fn keep_valid<I>(repository: Repository, converted: I) -> Vec<SceneRecord>
where
    I: IntoIterator<Item = (String, forcesar_core::Result<SceneRecord>)>,
{
    converted
        .into_iter()
        .filter_map(|(id, record)| {
            match record.and_then(|r| r.validate().map(|_| r)) {
                Ok(r) => Some(r),
                Err(e) => {
                    warn!("{}: dropping record {}: {}", repository, id, e);
                    None
                }
            }
        })
        .collect()
}
