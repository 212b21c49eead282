//! GML coordinate-list footprints.
//!
//! Resto catalogs publish footprints as
//! `<gml:MultiPolygon ...><gml:coordinates>x,y x,y ...</gml:coordinates>...`:
//! commas join the two ordinates of a vertex and spaces separate vertices.
//! WKT wants the opposite, so the list is rewritten in three ordered steps
//! (`,` -> `;`, ` ` -> `, `, `;` -> ` `). Swapping the order corrupts the
//! geometry.

use geo::Polygon;

use super::wkt::polygon_from_wkt;
use crate::error::{Error, Result};

const COORDINATES_OPEN: &str = "<gml:coordinates";
const COORDINATES_CLOSE: &str = "</gml:coordinates>";

/// Extract the first `<gml:coordinates>` payload.
///
/// Input without any GML markup is returned unchanged (trimmed), so bare
/// coordinate lists go through the same path.
pub fn coordinate_list(raw: &str) -> Result<&str> {
    let Some(start) = raw.find(COORDINATES_OPEN) else {
        return Ok(raw.trim());
    };
    let after_tag = &raw[start..];
    let open_end = after_tag
        .find('>')
        .ok_or_else(|| Error::geometry("unterminated <gml:coordinates> tag"))?;
    let payload = &after_tag[open_end + 1..];
    let close = payload
        .find(COORDINATES_CLOSE)
        .ok_or_else(|| Error::geometry("missing </gml:coordinates>"))?;
    Ok(payload[..close].trim())
}

/// Rewrite a GML coordinate list (`x,y x,y`) into WKT vertex syntax (`x y, x y`).
pub fn rewrite_coordinate_list(coords: &str) -> String {
    let normalized = coords.split_whitespace().collect::<Vec<_>>().join(" ");
    normalized
        .replace(',', ";")
        .replace(' ', ", ")
        .replace(';', " ")
}

/// Decode a GML footprint into a polygon.
pub fn polygon_from_gml(raw: &str) -> Result<Polygon<f64>> {
    let coords = coordinate_list(raw)?;
    if coords.is_empty() {
        return Err(Error::geometry("empty GML coordinate list"));
    }
    polygon_from_wkt(&format!("POLYGON(({}))", rewrite_coordinate_list(coords)))
}
