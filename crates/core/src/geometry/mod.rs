//! Geometry codec
//!
//! Converts between the area-of-interest geometry, the WKT strings embedded
//! in catalog queries and tool invocations, and the footprint encodings the
//! catalogs return:
//! - GML coordinate lists (resto catalogs)
//! - GeoJSON geometry objects (ASF search)
//! - WKT text

mod geojson;
mod gml;
mod wkt;

pub use geojson::{multipolygon_from_geojson, polygon_from_geojson};
pub use gml::{coordinate_list, polygon_from_gml, rewrite_coordinate_list};
pub use wkt::{polygon_from_wkt, polygon_to_wkt};

use geo::{BoundingRect, ConvexHull, MultiPolygon, Polygon};
use serde_json::Value;

use crate::error::{Error, Result};

/// A footprint as returned by one catalog backend, before decoding.
#[derive(Debug, Clone, Copy)]
pub enum CatalogGeometry<'a> {
    /// GML `<gml:coordinates>` payload (or the full GML fragment).
    Gml(&'a str),
    /// GeoJSON geometry object.
    GeoJson(&'a Value),
    /// WKT `POLYGON` text.
    Wkt(&'a str),
}

/// Decode a backend-specific footprint into the canonical polygon.
pub fn from_catalog_geometry(raw: CatalogGeometry<'_>) -> Result<Polygon<f64>> {
    let polygon = match raw {
        CatalogGeometry::Gml(text) => polygon_from_gml(text)?,
        CatalogGeometry::GeoJson(value) => polygon_from_geojson(value)?,
        CatalogGeometry::Wkt(text) => polygon_from_wkt(text)?,
    };
    if polygon.exterior().0.len() < 4 {
        return Err(Error::geometry("degenerate footprint"));
    }
    Ok(polygon)
}

/// WKT of the convex hull of `geometry`, for embedding in a catalog query.
///
/// Catalogs only accept simple polygons, so multi-part areas are collapsed
/// to their hull here; exact filtering happens locally afterwards.
pub fn to_query_string(geometry: &MultiPolygon<f64>) -> String {
    polygon_to_wkt(&geometry.convex_hull())
}

/// Axis-aligned envelope of `geometry` as a polygon, `None` when empty.
pub fn envelope(geometry: &MultiPolygon<f64>) -> Option<Polygon<f64>> {
    geometry.bounding_rect().map(|rect| rect.to_polygon())
}
