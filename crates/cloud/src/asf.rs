//! ASF (Alaska Satellite Facility) search client.
//!
//! ASF has its own parameter vocabulary (`platform=Sentinel-1`,
//! `processingLevel=GRD_HD`, `beamMode`, `flightDirection`, `relativeOrbit`,
//! `intersectsWith`) and answers with a GeoJSON feature collection in one
//! response; there is no paging.

use forcesar_core::geometry::{from_catalog_geometry, CatalogGeometry};
use forcesar_core::scene::{normalize_platform, normalize_product_type, parse_acquisition_date};
use forcesar_core::{ProcessingLevel, Repository, SceneRecord};
use serde::Deserialize;
use tracing::{debug, info};

use crate::catalog::{
    decode_feature, fetch_text, http_client, keep_valid, query_failed, CatalogClient,
    CatalogOptions,
};
use crate::de::{f64_lenient, u32_lenient};
use crate::error::{CatalogError, Result};
use crate::filters::SearchFilters;

pub const ASF_SEARCH_URL: &str = "https://api.daac.asf.alaska.edu/services/search/param";

// ---------------------------------------------------------------------------
// Response models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AsfFeatureCollection {
    /// Decoded one by one; see [`parse_response`].
    pub features: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AsfFeature {
    pub geometry: serde_json::Value,
    pub properties: AsfProperties,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsfProperties {
    #[serde(default, rename = "fileID")]
    pub file_id: Option<String>,
    /// Mapped to `acquisition_date`.
    pub stop_time: String,
    /// Relative orbit.
    #[serde(deserialize_with = "u32_lenient")]
    pub path_number: u32,
    pub flight_direction: String,
    /// Product type in ASF terms (`GRD_HD`, `SLC`, ...).
    pub processing_level: String,
    pub platform: String,
    pub beam_mode_type: String,
    #[serde(deserialize_with = "f64_lenient")]
    pub center_lon: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub center_lat: f64,
    /// Download URL, used as the product identifier.
    pub url: String,
}

impl AsfFeature {
    /// Map this feature onto the canonical record.
    pub fn into_record(self) -> forcesar_core::Result<SceneRecord> {
        let p = self.properties;
        let footprint = from_catalog_geometry(CatalogGeometry::GeoJson(&self.geometry))?;
        let product_type = normalize_product_type(&p.processing_level);
        let processing_level = if product_type == "OCN" {
            ProcessingLevel::Level2
        } else {
            ProcessingLevel::Level1
        };
        Ok(SceneRecord {
            acquisition_date: parse_acquisition_date(&p.stop_time)?,
            relative_orbit_number: p.path_number,
            orbit_direction: p.flight_direction.parse()?,
            product_type,
            processing_level,
            platform: normalize_platform(&p.platform),
            sensor_mode: p.beam_mode_type.trim().to_uppercase(),
            centroid_lon: p.center_lon,
            centroid_lat: p.center_lat,
            product_identifier: p.url,
            footprint,
        })
    }
}

/// Parse a search response into records.
///
/// Features that fail to decode or validate are logged and dropped; only a
/// body that is not a feature collection is an error.
pub fn parse_response(body: &str) -> Result<Vec<SceneRecord>> {
    let collection: AsfFeatureCollection =
        serde_json::from_str(body).map_err(|e| CatalogError::MalformedResponse {
            repository: Repository::Asf,
            reason: e.to_string(),
        })?;
    Ok(keep_valid(
        Repository::Asf,
        collection.features.into_iter().enumerate().map(|(idx, raw)| {
            let id = raw
                .pointer("/properties/fileID")
                .and_then(serde_json::Value::as_str)
                .map_or_else(|| format!("#{idx}"), str::to_string);
            (id, decode_feature::<AsfFeature>(raw).and_then(AsfFeature::into_record))
        }),
    ))
}

/// `Sentinel1` -> `Sentinel-1`.
fn asf_platform(satellite: &str) -> String {
    match satellite.strip_prefix("Sentinel") {
        Some(rest) if !rest.starts_with('-') => format!("Sentinel-{rest}"),
        _ => satellite.to_string(),
    }
}

/// `GRD` -> `GRD_HD`; other product types pass through.
fn asf_product_type(product_type: &str) -> String {
    if product_type.eq_ignore_ascii_case("GRD") {
        "GRD_HD".to_string()
    } else {
        product_type.to_uppercase()
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Async client for the ASF search API.
pub struct AsfClient {
    search_url: String,
    client: reqwest::Client,
    options: CatalogOptions,
}

impl AsfClient {
    pub fn new(options: CatalogOptions) -> Result<Self> {
        Self::with_search_url(ASF_SEARCH_URL, options)
    }

    /// Create a client against a custom search endpoint.
    pub fn with_search_url(search_url: &str, options: CatalogOptions) -> Result<Self> {
        Ok(Self {
            search_url: search_url.to_string(),
            client: http_client(&options)?,
            options,
        })
    }

    pub fn repository(&self) -> Repository {
        Repository::Asf
    }

    /// Query parameters for `filters`; unset filters produce no parameter.
    pub fn query_pairs(filters: &SearchFilters, max_results: usize) -> Vec<(&'static str, String)> {
        let mut q = Vec::new();
        if let Some(v) = &filters.satellite {
            q.push(("platform", asf_platform(v)));
        }
        if let Some(v) = &filters.product_type {
            q.push(("processingLevel", asf_product_type(v)));
        }
        if let Some(v) = &filters.sensor_mode {
            q.push(("beamMode", v.to_uppercase()));
        }
        if let Some(wkt) = filters.geometry_wkt() {
            q.push(("intersectsWith", wkt));
        }
        if let Some(d) = filters.start_date {
            q.push(("start", format!("{}T00:00:00Z", d.format("%Y-%m-%d"))));
        }
        if let Some(d) = filters.end_date {
            q.push(("end", format!("{}T23:59:59Z", d.format("%Y-%m-%d"))));
        }
        if let Some(v) = filters.relative_orbit {
            q.push(("relativeOrbit", v.to_string()));
        }
        if let Some(v) = filters.orbit_direction {
            q.push(("flightDirection", v.as_query_value().to_string()));
        }
        if let Some(level) = filters.processing_level {
            debug!("ASF has no processing level filter, level {} is applied after the query", level);
        }
        q.push(("maxResults", max_results.to_string()));
        q.push(("output", "geojson".to_string()));
        q
    }
}

impl CatalogClient for AsfClient {
    fn repository(&self) -> Repository {
        Repository::Asf
    }

    async fn query(&self, filters: &SearchFilters) -> Result<Vec<SceneRecord>> {
        let query = Self::query_pairs(filters, self.options.max_items);
        debug!("ASF search {} {:?}", self.search_url, query);
        let result = async {
            let body = fetch_text(self.client.get(&self.search_url).query(&query)).await?;
            parse_response(&body)
        }
        .await;
        match result {
            Ok(records) => {
                info!("ASF: {} records", records.len());
                Ok(records)
            }
            Err(e) => Err(query_failed(Repository::Asf, filters, e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use forcesar_core::OrbitDirection;
    use geo::polygon;
    use std::collections::HashMap;

    const FIXTURE: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[7.9, 47.1], [10.3, 47.1], [10.3, 49.5], [7.9, 49.5], [7.9, 47.1]]]
      },
      "properties": {
        "fileID": "S1A_IW_GRDH_1SDV_20230105T172215_20230105T172240_046640_05973D_1A2B-GRD_HD",
        "startTime": "2023-01-05T17:22:15.000Z",
        "stopTime": "2023-01-05T17:22:40.000Z",
        "pathNumber": "44",
        "flightDirection": "ASCENDING",
        "processingLevel": "GRD_HD",
        "platform": "Sentinel-1A",
        "beamModeType": "IW",
        "centerLon": "9.1",
        "centerLat": "48.3",
        "url": "https://datapool.asf.alaska.edu/GRD_HD/SA/S1A_IW_GRDH_1SDV_20230105T172215_20230105T172240_046640_05973D_1A2B.zip"
      }
    },
    {
      "type": "Feature",
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
      },
      "properties": {
        "fileID": "misplaced-centroid",
        "stopTime": "2023-01-06T05:40:00.000Z",
        "pathNumber": 117,
        "flightDirection": "DESCENDING",
        "processingLevel": "GRD_HD",
        "platform": "Sentinel-1A",
        "beamModeType": "IW",
        "centerLon": 20.0,
        "centerLat": 20.0,
        "url": "https://datapool.asf.alaska.edu/GRD_HD/SA/misplaced.zip"
      }
    }
  ]
}"#;

    #[test]
    fn parse_response_maps_fields() {
        let records = parse_response(FIXTURE).unwrap();
        assert_eq!(records.len(), 1, "record with misplaced centroid is dropped");

        let r = &records[0];
        assert_eq!(r.acquisition_date, NaiveDate::from_ymd_opt(2023, 1, 5).unwrap());
        assert_eq!(r.relative_orbit_number, 44);
        assert_eq!(r.orbit_direction, OrbitDirection::Ascending);
        assert_eq!(r.product_type, "GRD");
        assert_eq!(r.processing_level, ProcessingLevel::Level1);
        assert_eq!(r.platform, "S1A");
        assert_eq!(r.sensor_mode, "IW");
        assert_eq!((r.centroid_lon, r.centroid_lat), (9.1, 48.3));
        assert!(r.product_identifier.starts_with("https://datapool.asf.alaska.edu/"));
        assert_eq!(
            r.footprint,
            polygon![(x: 7.9, y: 47.1), (x: 10.3, y: 47.1), (x: 10.3, y: 49.5), (x: 7.9, y: 49.5)]
        );
    }

    #[test]
    fn ocn_is_level2() {
        let body = FIXTURE.replacen("\"GRD_HD\"", "\"OCN\"", 1);
        let records = parse_response(&body).unwrap();
        assert_eq!(records[0].product_type, "OCN");
        assert_eq!(records[0].processing_level, ProcessingLevel::Level2);
    }

    #[test]
    fn undecodable_feature_is_dropped() {
        let mut collection: serde_json::Value = serde_json::from_str(FIXTURE).unwrap();
        let features = collection["features"].as_array_mut().unwrap();
        let mut broken = features[0].clone();
        broken["properties"]["flightDirection"] = serde_json::Value::Null;
        broken["properties"]["fileID"] = "null-direction".into();
        let mut missing = features[0].clone();
        missing["properties"]
            .as_object_mut()
            .unwrap()
            .remove("pathNumber");
        features.insert(0, broken);
        features.insert(0, missing);

        let records = parse_response(&collection.to_string()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].relative_orbit_number, 44);
    }

    #[test]
    fn malformed_response_is_an_error() {
        let err = parse_response(r#"{"results": []}"#).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MalformedResponse { repository: Repository::Asf, .. }
        ));
    }

    #[test]
    fn vocabulary_is_translated() {
        let filters = SearchFilters::new()
            .satellite("Sentinel1")
            .product_type("GRD")
            .sensor_mode("IW")
            .processing_level(ProcessingLevel::Level1)
            .relative_orbit(44)
            .orbit_direction(OrbitDirection::Ascending)
            .date_range(
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(),
            );
        let q: HashMap<&str, String> = AsfClient::query_pairs(&filters, 250).into_iter().collect();
        assert_eq!(q["platform"], "Sentinel-1");
        assert_eq!(q["processingLevel"], "GRD_HD");
        assert_eq!(q["beamMode"], "IW");
        assert_eq!(q["relativeOrbit"], "44");
        assert_eq!(q["flightDirection"], "ASCENDING");
        assert_eq!(q["start"], "2023-01-01T00:00:00Z");
        assert_eq!(q["end"], "2023-01-31T23:59:59Z");
        assert_eq!(q["maxResults"], "250");
        assert_eq!(q["output"], "geojson");
        assert!(!q.contains_key("intersectsWith"));
    }

    #[test]
    fn unset_filters_are_omitted() {
        let keys: Vec<&str> = AsfClient::query_pairs(&SearchFilters::new(), 10)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, ["maxResults", "output"]);
    }

    #[test]
    fn platform_names() {
        assert_eq!(asf_platform("Sentinel1"), "Sentinel-1");
        assert_eq!(asf_platform("Sentinel-1"), "Sentinel-1");
        assert_eq!(asf_product_type("slc"), "SLC");
    }
}
