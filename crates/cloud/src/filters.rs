//! Structured catalog search filters.
//!
//! Every field is optional: a set field enables the matching query clause,
//! an unset field omits it from the request entirely.

use std::fmt;

use chrono::NaiveDate;
use forcesar_core::geometry::polygon_to_wkt;
use forcesar_core::{OrbitDirection, ProcessingLevel, RunConfig};
use geo::Polygon;

/// Catalog search filters shared by all backends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    /// Collection / mission, e.g. `Sentinel1`.
    pub satellite: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub product_type: Option<String>,
    pub processing_level: Option<ProcessingLevel>,
    pub sensor_mode: Option<String>,
    pub relative_orbit: Option<u32>,
    pub orbit_direction: Option<OrbitDirection>,
    /// Query polygon (simple polygon, usually the AOI convex hull).
    pub geometry: Option<Polygon<f64>>,
}

impl SearchFilters {
    /// Create empty filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters for a run: mission, product, dates and direction from the config.
    pub fn from_config(config: &RunConfig) -> Self {
        let search = &config.search;
        Self {
            satellite: search.satellite.clone(),
            start_date: Some(config.start_date),
            end_date: Some(config.end_date),
            product_type: search.product_type.clone(),
            processing_level: search.processing_level,
            sensor_mode: search.sensor_mode.clone(),
            relative_orbit: None,
            orbit_direction: search.orbit_direction,
            geometry: None,
        }
    }

    pub fn satellite(mut self, satellite: &str) -> Self {
        self.satellite = Some(satellite.to_string());
        self
    }

    /// Set the inclusive acquisition date range.
    pub fn date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn product_type(mut self, product_type: &str) -> Self {
        self.product_type = Some(product_type.to_string());
        self
    }

    pub fn processing_level(mut self, level: ProcessingLevel) -> Self {
        self.processing_level = Some(level);
        self
    }

    pub fn sensor_mode(mut self, mode: &str) -> Self {
        self.sensor_mode = Some(mode.to_string());
        self
    }

    pub fn relative_orbit(mut self, orbit: u32) -> Self {
        self.relative_orbit = Some(orbit);
        self
    }

    pub fn orbit_direction(mut self, direction: OrbitDirection) -> Self {
        self.orbit_direction = Some(direction);
        self
    }

    pub fn geometry(mut self, polygon: Polygon<f64>) -> Self {
        self.geometry = Some(polygon);
        self
    }

    /// Query polygon as WKT.
    pub fn geometry_wkt(&self) -> Option<String> {
        self.geometry.as_ref().map(polygon_to_wkt)
    }

    /// Whether no clause is enabled.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for SearchFilters {
    /// Compact `key=value` listing of the set fields, used as error context.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(v) = &self.satellite {
            parts.push(format!("satellite={v}"));
        }
        if let Some(v) = &self.start_date {
            parts.push(format!("start={v}"));
        }
        if let Some(v) = &self.end_date {
            parts.push(format!("end={v}"));
        }
        if let Some(v) = &self.product_type {
            parts.push(format!("productType={v}"));
        }
        if let Some(v) = &self.processing_level {
            parts.push(format!("processingLevel={v}"));
        }
        if let Some(v) = &self.sensor_mode {
            parts.push(format!("sensorMode={v}"));
        }
        if let Some(v) = &self.relative_orbit {
            parts.push(format!("relativeOrbit={v}"));
        }
        if let Some(v) = &self.orbit_direction {
            parts.push(format!("orbitDirection={v}"));
        }
        if let Some(g) = &self.geometry {
            parts.push(format!("geometry=<{} vertices>", g.exterior().0.len()));
        }
        if parts.is_empty() {
            write!(f, "no filters")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn empty_filters() {
        let filters = SearchFilters::new();
        assert!(filters.is_empty());
        assert_eq!(filters.to_string(), "no filters");
        assert!(filters.geometry_wkt().is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let filters = SearchFilters::new()
            .satellite("Sentinel1")
            .date_range(
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(),
            )
            .relative_orbit(44)
            .orbit_direction(OrbitDirection::Ascending);
        assert!(!filters.is_empty());
        assert_eq!(
            filters.to_string(),
            "satellite=Sentinel1 start=2023-01-01 end=2023-01-31 relativeOrbit=44 orbitDirection=ascending"
        );
    }

    #[test]
    fn geometry_rendered_as_wkt() {
        let filters = SearchFilters::new()
            .geometry(polygon![(x: 9.0, y: 47.5), (x: 10.0, y: 47.5), (x: 10.0, y: 48.5)]);
        assert_eq!(
            filters.geometry_wkt().as_deref(),
            Some("POLYGON((9 47.5, 10 47.5, 10 48.5, 9 47.5))")
        );
        assert!(filters.to_string().contains("geometry=<4 vertices>"));
    }
}
