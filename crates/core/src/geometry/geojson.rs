//! GeoJSON geometry objects (as raw `serde_json::Value`) to `geo` types.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;

use crate::error::{Error, Result};

/// Decode a GeoJSON `Polygon` or `MultiPolygon` geometry.
pub fn multipolygon_from_geojson(geometry: &Value) -> Result<MultiPolygon<f64>> {
    let coordinates = geometry
        .get("coordinates")
        .ok_or_else(|| Error::geometry("GeoJSON geometry without coordinates"))?;

    match geometry_type(geometry)? {
        "Polygon" => Ok(MultiPolygon::new(vec![polygon_from_rings(coordinates)?])),
        "MultiPolygon" => {
            let parts = coordinates
                .as_array()
                .ok_or_else(|| Error::geometry("MultiPolygon coordinates must be an array"))?;
            Ok(MultiPolygon::new(
                parts.iter().map(polygon_from_rings).collect::<Result<Vec<_>>>()?,
            ))
        }
        other => Err(Error::geometry(format!("unsupported GeoJSON geometry type {other}"))),
    }
}

/// Decode a GeoJSON `Polygon`, or a `MultiPolygon` with exactly one part.
pub fn polygon_from_geojson(geometry: &Value) -> Result<Polygon<f64>> {
    let mut parts = multipolygon_from_geojson(geometry)?.0;
    if parts.len() != 1 {
        return Err(Error::geometry(format!(
            "expected a single polygon, got {} parts",
            parts.len()
        )));
    }
    Ok(parts.remove(0))
}

fn geometry_type(geometry: &Value) -> Result<&str> {
    geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::geometry("GeoJSON geometry without type"))
}

fn polygon_from_rings(rings: &Value) -> Result<Polygon<f64>> {
    let rings = rings
        .as_array()
        .ok_or_else(|| Error::geometry("polygon rings must be an array"))?;
    let mut rings = rings.iter().map(ring);
    let exterior = rings
        .next()
        .ok_or_else(|| Error::geometry("polygon without exterior ring"))??;
    Ok(Polygon::new(exterior, rings.collect::<Result<Vec<_>>>()?))
}

fn ring(value: &Value) -> Result<LineString<f64>> {
    let positions = value
        .as_array()
        .ok_or_else(|| Error::geometry("ring must be an array of positions"))?;
    let coords = positions
        .iter()
        .map(|p| {
            let x = p.get(0).and_then(Value::as_f64);
            let y = p.get(1).and_then(Value::as_f64);
            match (x, y) {
                (Some(x), Some(y)) => Ok(Coord { x, y }),
                _ => Err(Error::geometry(format!("invalid position {p}"))),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    if coords.len() < 3 {
        return Err(Error::geometry(format!(
            "ring needs at least 3 positions, got {}",
            coords.len()
        )));
    }
    Ok(LineString::new(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn polygon_geometry() {
        let g = json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
        });
        let p = polygon_from_geojson(&g).unwrap();
        assert_eq!(p.exterior().0.len(), 4);
    }

    #[test]
    fn multipolygon_geometry() {
        let g = json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[0, 0], [1, 0], [1, 1], [0, 0]]],
                [[[5, 5], [6, 5], [6, 6], [5, 5]]]
            ]
        });
        assert_eq!(multipolygon_from_geojson(&g).unwrap().0.len(), 2);
        assert!(polygon_from_geojson(&g).is_err());
    }

    #[test]
    fn rejects_points_and_bad_positions() {
        assert!(multipolygon_from_geojson(&json!({"type": "Point", "coordinates": [1, 2]})).is_err());
        let bad = json!({"type": "Polygon", "coordinates": [[[0, 0], ["a", 0], [1, 1]]]});
        assert!(polygon_from_geojson(&bad).is_err());
    }
}
