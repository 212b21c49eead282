//! Minimal WKT reader/writer for polygons.
//!
//! Only the `POLYGON` tagged text is supported; that is all the catalogs
//! accept in query strings and all the processing tool accepts as a clip
//! window.

use geo::{Coord, LineString, Polygon};

use crate::error::{Error, Result};

const POLYGON_TAG: &str = "POLYGON";

/// Render a polygon as WKT, e.g. `POLYGON((9 47.5, 10 47.5, 10 48.5, 9 47.5))`.
pub fn polygon_to_wkt(polygon: &Polygon<f64>) -> String {
    if polygon.exterior().0.is_empty() {
        return format!("{POLYGON_TAG} EMPTY");
    }
    let rings: Vec<String> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring_to_wkt)
        .collect();
    format!("{POLYGON_TAG}({})", rings.join(", "))
}

fn ring_to_wkt(ring: &LineString<f64>) -> String {
    let coords: Vec<String> = ring.0.iter().map(|c| format!("{} {}", c.x, c.y)).collect();
    format!("({})", coords.join(", "))
}

/// Parse a WKT `POLYGON` string.
///
/// Extra ordinates (Z/M) are ignored. An unclosed exterior ring is closed.
pub fn polygon_from_wkt(text: &str) -> Result<Polygon<f64>> {
    let text = text.trim();
    let body = text
        .get(..POLYGON_TAG.len())
        .filter(|tag| tag.eq_ignore_ascii_case(POLYGON_TAG))
        .map(|_| text[POLYGON_TAG.len()..].trim())
        .ok_or_else(|| Error::geometry(format!("not a WKT polygon: {}", preview(text))))?;

    if body.eq_ignore_ascii_case("EMPTY") {
        return Ok(Polygon::new(LineString::new(vec![]), vec![]));
    }

    let inner = body
        .strip_prefix('(')
        .and_then(|b| b.strip_suffix(')'))
        .ok_or_else(|| Error::geometry(format!("unbalanced parentheses: {}", preview(text))))?
        .trim();

    let mut rings = Vec::new();
    let mut rest = inner;
    while !rest.is_empty() {
        let ring = rest
            .strip_prefix('(')
            .ok_or_else(|| Error::geometry(format!("expected '(' in {}", preview(text))))?;
        let end = ring
            .find(')')
            .ok_or_else(|| Error::geometry(format!("unterminated ring in {}", preview(text))))?;
        rings.push(parse_ring(&ring[..end])?);
        rest = ring[end + 1..].trim_start();
        rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
    }

    let mut rings = rings.into_iter();
    let exterior = rings
        .next()
        .ok_or_else(|| Error::geometry("polygon without rings"))?;
    Ok(Polygon::new(exterior, rings.collect()))
}

fn parse_ring(text: &str) -> Result<LineString<f64>> {
    let coords = text
        .split(',')
        .map(|pair| {
            let mut ordinates = pair.split_whitespace();
            let x = parse_ordinate(ordinates.next(), pair)?;
            let y = parse_ordinate(ordinates.next(), pair)?;
            Ok(Coord { x, y })
        })
        .collect::<Result<Vec<_>>>()?;

    if coords.len() < 3 {
        return Err(Error::geometry(format!(
            "ring needs at least 3 coordinates, got {}",
            coords.len()
        )));
    }
    Ok(LineString::new(coords))
}

fn parse_ordinate(token: Option<&str>, pair: &str) -> Result<f64> {
    let value: f64 = token
        .ok_or_else(|| Error::geometry(format!("incomplete coordinate pair {:?}", pair.trim())))?
        .parse()
        .map_err(|_| Error::geometry(format!("invalid coordinate pair {:?}", pair.trim())))?;
    if !value.is_finite() {
        return Err(Error::geometry(format!("non-finite coordinate in {:?}", pair.trim())));
    }
    Ok(value)
}

fn preview(text: &str) -> String {
    text.chars().take(80).collect()
}
