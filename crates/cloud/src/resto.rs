//! Resto search client (CODE-DE, CREODIAS).
//!
//! Both catalogs run the same resto API: `GET {base}{collection}/search.json`
//! with one query parameter per filter, answering with a JSON feature
//! collection whose footprints are GML coordinate lists.

use forcesar_core::geometry::{from_catalog_geometry, CatalogGeometry};
use forcesar_core::scene::{normalize_platform, normalize_product_type, parse_acquisition_date};
use forcesar_core::{Error as CoreError, ProcessingLevel, Repository, SceneRecord};
use geo::Centroid;
use serde::Deserialize;
use tracing::{debug, info};

use crate::catalog::{
    decode_feature, fetch_text, http_client, keep_valid, query_failed, CatalogClient,
    CatalogOptions,
};
use crate::de::{f64_lenient, u32_lenient};
use crate::error::{CatalogError, Result};
use crate::filters::SearchFilters;

pub const CODEDE_BASE_URL: &str = "https://finder.code-de.org/resto/api/collections/";
pub const CREODIAS_BASE_URL: &str = "https://datahub.creodias.eu/resto/api/collections/";

// ---------------------------------------------------------------------------
// Response models
// ---------------------------------------------------------------------------

/// One page of a resto search.
///
/// Features stay raw here and are decoded one by one, so a broken feature
/// only costs that record.
#[derive(Debug, Clone, Deserialize)]
pub struct RestoFeatureCollection {
    pub features: Vec<serde_json::Value>,

    #[serde(default)]
    pub properties: RestoCollectionProperties,

    /// Newer resto versions put links at the top level.
    #[serde(default)]
    pub links: Vec<RestoLink>,
}

impl RestoFeatureCollection {
    /// The `"next"` page link, if any.
    pub fn next_link(&self) -> Option<&RestoLink> {
        self.links
            .iter()
            .chain(self.properties.links.iter())
            .find(|l| l.rel == "next")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestoCollectionProperties {
    #[serde(rename = "totalResults")]
    pub total_results: Option<u64>,

    #[serde(default)]
    pub links: Vec<RestoLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestoLink {
    pub rel: String,
    pub href: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestoFeature {
    #[serde(default)]
    pub id: Option<String>,
    pub properties: RestoProperties,
}

/// Feature properties; the field names are the resto column names.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoProperties {
    /// Mapped to `acquisition_date`.
    pub completion_date: String,
    #[serde(deserialize_with = "u32_lenient")]
    pub relative_orbit_number: u32,
    pub orbit_direction: String,
    pub product_type: String,
    #[serde(default)]
    pub processing_level: Option<String>,
    pub platform: String,
    pub sensor_mode: String,
    #[serde(default)]
    pub centroid: Option<RestoPoint>,
    pub product_identifier: String,
    #[serde(default, rename = "gmlgeometry")]
    pub gml_geometry: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestoPoint {
    pub coordinates: Vec<serde_json::Value>,
}

impl RestoPoint {
    fn lon_lat(&self) -> Option<(f64, f64)> {
        let lon = self.coordinates.first().and_then(lenient_f64)?;
        let lat = self.coordinates.get(1).and_then(lenient_f64)?;
        Some((lon, lat))
    }
}

fn lenient_f64(v: &serde_json::Value) -> Option<f64> {
    f64_lenient(v).ok()
}

impl RestoFeature {
    /// Map this feature onto the canonical record.
    pub fn into_record(self) -> forcesar_core::Result<SceneRecord> {
        let p = self.properties;
        let gml = p
            .gml_geometry
            .as_deref()
            .ok_or_else(|| CoreError::Geometry("feature has no gmlgeometry".into()))?;
        let footprint = from_catalog_geometry(CatalogGeometry::Gml(gml))?;

        let (centroid_lon, centroid_lat) = match p.centroid.as_ref().and_then(RestoPoint::lon_lat) {
            Some(c) => c,
            None => footprint
                .centroid()
                .map(|pt| (pt.x(), pt.y()))
                .ok_or_else(|| CoreError::Geometry("footprint has no centroid".into()))?,
        };

        let processing_level = match p.processing_level.as_deref() {
            Some(level) => level.parse()?,
            None => ProcessingLevel::Level1,
        };

        Ok(SceneRecord {
            acquisition_date: parse_acquisition_date(&p.completion_date)?,
            relative_orbit_number: p.relative_orbit_number,
            orbit_direction: p.orbit_direction.parse()?,
            product_type: normalize_product_type(&p.product_type),
            processing_level,
            platform: normalize_platform(&p.platform),
            sensor_mode: p.sensor_mode.trim().to_uppercase(),
            centroid_lon,
            centroid_lat,
            product_identifier: p.product_identifier,
            footprint,
        })
    }
}

/// Parse one page body into records (invalid records dropped) and the next link.
pub fn parse_page(repository: Repository, body: &str) -> Result<(Vec<SceneRecord>, Option<String>)> {
    let page: RestoFeatureCollection =
        serde_json::from_str(body).map_err(|e| CatalogError::MalformedResponse {
            repository,
            reason: e.to_string(),
        })?;
    let next = page.next_link().map(|l| l.href.clone());
    let records = keep_valid(
        repository,
        page.features.into_iter().enumerate().map(|(idx, raw)| {
            let id = raw
                .get("id")
                .and_then(serde_json::Value::as_str)
                .map_or_else(|| format!("#{idx}"), str::to_string);
            (id, decode_feature::<RestoFeature>(raw).and_then(RestoFeature::into_record))
        }),
    );
    Ok((records, next))
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Async client for one resto catalog.
pub struct RestoClient {
    repository: Repository,
    base_url: String,
    client: reqwest::Client,
    options: CatalogOptions,
}

impl RestoClient {
    /// Create a client for CODE-DE or CREODIAS.
    pub fn new(repository: Repository, options: CatalogOptions) -> Result<Self> {
        let base = match repository {
            Repository::Creodias => CREODIAS_BASE_URL,
            _ => CODEDE_BASE_URL,
        };
        Self::with_base_url(repository, base, options)
    }

    /// Create a client against a custom resto endpoint.
    pub fn with_base_url(
        repository: Repository,
        base_url: &str,
        options: CatalogOptions,
    ) -> Result<Self> {
        let base_url = format!("{}/", base_url.trim_end_matches('/'));
        Ok(Self {
            repository,
            base_url,
            client: http_client(&options)?,
            options,
        })
    }

    /// Search endpoint for the filters' collection.
    pub fn search_url(&self, filters: &SearchFilters) -> String {
        match &filters.satellite {
            Some(collection) => format!("{}{}/search.json", self.base_url, collection),
            None => format!("{}search.json", self.base_url),
        }
    }

    /// Query parameters for `filters`; unset filters produce no parameter.
    pub fn query_pairs(filters: &SearchFilters, page_size: u32) -> Vec<(&'static str, String)> {
        let mut q = vec![("maxRecords", page_size.to_string())];
        if let Some(d) = filters.start_date {
            q.push(("startDate", format!("{}T00:00:00Z", d.format("%Y-%m-%d"))));
        }
        if let Some(d) = filters.end_date {
            q.push(("completionDate", format!("{}T23:59:59.999Z", d.format("%Y-%m-%d"))));
        }
        if let Some(v) = &filters.product_type {
            q.push(("productType", v.clone()));
        }
        if let Some(v) = filters.relative_orbit {
            q.push(("relativeOrbitNumber", v.to_string()));
        }
        if let Some(v) = filters.orbit_direction {
            q.push(("orbitDirection", v.as_query_value().to_string()));
        }
        if let Some(v) = &filters.sensor_mode {
            q.push(("sensorMode", v.clone()));
        }
        if let Some(v) = filters.processing_level {
            q.push(("processingLevel", v.as_query_value().to_string()));
        }
        if let Some(wkt) = filters.geometry_wkt() {
            q.push(("geometry", wkt));
        }
        q.push(("sortParam", "startDate".to_string()));
        q
    }

    /// Fetch all pages, following `next` links up to `max_items` records.
    async fn search_all(&self, filters: &SearchFilters) -> Result<Vec<SceneRecord>> {
        let url = self.search_url(filters);
        let query = Self::query_pairs(filters, self.options.page_size);
        debug!("{} search {} {:?}", self.repository, url, query);

        let body = fetch_text(self.client.get(&url).query(&query)).await?;
        let (mut records, mut next) = parse_page(self.repository, &body)?;
        info!("{}: page 1, {} records", self.repository, records.len());

        let mut page_no = 1;
        while let Some(href) = next.take() {
            if records.len() >= self.options.max_items {
                break;
            }
            page_no += 1;
            let body = fetch_text(self.client.get(&href)).await?;
            let (page, following) = parse_page(self.repository, &body)?;
            info!("{}: page {}, {} records", self.repository, page_no, page.len());
            if page.is_empty() {
                break;
            }
            records.extend(page);
            next = following;
        }

        records.truncate(self.options.max_items);
        Ok(records)
    }
}

impl CatalogClient for RestoClient {
    fn repository(&self) -> Repository {
        self.repository
    }

    async fn query(&self, filters: &SearchFilters) -> Result<Vec<SceneRecord>> {
        self.search_all(filters)
            .await
            .map_err(|e| query_failed(self.repository, filters, e))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
