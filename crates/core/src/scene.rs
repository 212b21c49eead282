//! Canonical scene record shared by every catalog backend.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use geo::{BoundingRect, Coord, Polygon, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How far (degrees) a centroid may sit outside its footprint's bounding box.
pub const CENTROID_TOLERANCE_DEG: f64 = 0.5;

/// Satellite pass direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrbitDirection {
    Ascending,
    Descending,
}

impl OrbitDirection {
    /// Upper-case form used by the catalog query APIs.
    pub fn as_query_value(&self) -> &'static str {
        match self {
            Self::Ascending => "ASCENDING",
            Self::Descending => "DESCENDING",
        }
    }

    /// `A` or `D`.
    pub fn initial(&self) -> char {
        match self {
            Self::Ascending => 'A',
            Self::Descending => 'D',
        }
    }
}

impl FromStr for OrbitDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ascending" | "asc" | "a" => Ok(Self::Ascending),
            "descending" | "desc" | "d" => Ok(Self::Descending),
            other => Err(Error::config(
                "ORBIT_DIRECTION",
                format!("unknown orbit direction {other:?}"),
            )),
        }
    }
}

impl fmt::Display for OrbitDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "ascending"),
            Self::Descending => write!(f, "descending"),
        }
    }
}

/// Product processing level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessingLevel {
    Level1,
    Level2,
}

impl ProcessingLevel {
    /// `LEVEL1` / `LEVEL2`, as used by resto catalogs.
    pub fn as_query_value(&self) -> &'static str {
        match self {
            Self::Level1 => "LEVEL1",
            Self::Level2 => "LEVEL2",
        }
    }
}

impl FromStr for ProcessingLevel {
    type Err = Error;

    /// Accepts `1`, `2`, `LEVEL1`, `LEVEL2`, `L1`, `L2` in any case.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_uppercase();
        let digits = s
            .strip_prefix("LEVEL")
            .or_else(|| s.strip_prefix('L'))
            .unwrap_or(&s);
        match digits {
            "1" => Ok(Self::Level1),
            "2" => Ok(Self::Level2),
            _ => Err(Error::config(
                "PROCESSING_LEVEL",
                format!("unknown processing level {s:?}"),
            )),
        }
    }
}

impl fmt::Display for ProcessingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level1 => write!(f, "1"),
            Self::Level2 => write!(f, "2"),
        }
    }
}

/// One discovered image, in the schema every backend is mapped onto.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRecord {
    pub acquisition_date: NaiveDate,
    pub relative_orbit_number: u32,
    pub orbit_direction: OrbitDirection,
    pub product_type: String,
    pub processing_level: ProcessingLevel,
    /// Short platform code, e.g. `S1A`.
    pub platform: String,
    pub sensor_mode: String,
    pub centroid_lon: f64,
    pub centroid_lat: f64,
    /// Path or URL of the source product.
    pub product_identifier: String,
    /// Footprint in EPSG:4326.
    pub footprint: Polygon<f64>,
}

impl SceneRecord {
    /// Check that the centroid lies on (or near) the footprint.
    pub fn validate(&self) -> Result<()> {
        let bbox = self
            .footprint
            .bounding_rect()
            .ok_or_else(|| Error::geometry("empty footprint"))?;
        let grown = Rect::new(
            Coord {
                x: bbox.min().x - CENTROID_TOLERANCE_DEG,
                y: bbox.min().y - CENTROID_TOLERANCE_DEG,
            },
            Coord {
                x: bbox.max().x + CENTROID_TOLERANCE_DEG,
                y: bbox.max().y + CENTROID_TOLERANCE_DEG,
            },
        );
        let (lon, lat) = (self.centroid_lon, self.centroid_lat);
        let inside = lon >= grown.min().x
            && lon <= grown.max().x
            && lat >= grown.min().y
            && lat <= grown.max().y;
        if !inside {
            return Err(Error::geometry(format!(
                "centroid ({lon}, {lat}) is outside footprint of {}",
                self.product_identifier
            )));
        }
        Ok(())
    }
}

/// Normalize platform names: `Sentinel-1A`, `sentinel-1a` and `S1A` all map to `S1A`.
pub fn normalize_platform(raw: &str) -> String {
    let raw = raw.trim();
    let lower = raw.to_lowercase();
    match lower.strip_prefix("sentinel") {
        Some(rest) => {
            let rest: String = rest
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect();
            format!("S{}", rest.to_uppercase())
        }
        None => raw.to_uppercase(),
    }
}

/// Normalize product types to their family (`IW_GRDH_1S`, `GRD_HD` -> `GRD`).
pub fn normalize_product_type(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    ["GRD", "SLC", "OCN", "RAW"]
        .into_iter()
        .find(|family| upper.contains(family))
        .map(str::to_string)
        .unwrap_or(upper)
}

/// Parse the calendar date from an ISO-8601 date or datetime string.
pub fn parse_acquisition_date(raw: &str) -> Result<NaiveDate> {
    raw.trim()
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .ok_or_else(|| Error::Record(format!("invalid acquisition date {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn record(lon: f64, lat: f64) -> SceneRecord {
        SceneRecord {
            acquisition_date: NaiveDate::from_ymd_opt(2023, 1, 5).unwrap(),
            relative_orbit_number: 44,
            orbit_direction: OrbitDirection::Ascending,
            product_type: "GRD".into(),
            processing_level: ProcessingLevel::Level1,
            platform: "S1A".into(),
            sensor_mode: "IW".into(),
            centroid_lon: lon,
            centroid_lat: lat,
            product_identifier: "/eodata/x.SAFE".into(),
            footprint: polygon![(x: 8.0, y: 47.5), (x: 10.0, y: 47.5), (x: 10.0, y: 49.0), (x: 8.0, y: 49.0)],
        }
    }

    #[test]
    fn platform_names() {
        assert_eq!(normalize_platform("Sentinel-1A"), "S1A");
        assert_eq!(normalize_platform("sentinel-1b"), "S1B");
        assert_eq!(normalize_platform("S1A"), "S1A");
        assert_eq!(normalize_platform("s1c"), "S1C");
    }

    #[test]
    fn product_families() {
        assert_eq!(normalize_product_type("GRD_HD"), "GRD");
        assert_eq!(normalize_product_type("IW_GRDH_1S"), "GRD");
        assert_eq!(normalize_product_type("slc"), "SLC");
        assert_eq!(normalize_product_type("METADATA"), "METADATA");
    }

    #[test]
    fn orbit_direction_parsing() {
        assert_eq!("ASCENDING".parse::<OrbitDirection>().unwrap(), OrbitDirection::Ascending);
        assert_eq!("descending".parse::<OrbitDirection>().unwrap(), OrbitDirection::Descending);
        assert!("sideways".parse::<OrbitDirection>().is_err());
        assert_eq!(OrbitDirection::Descending.initial(), 'D');
    }

    #[test]
    fn processing_level_parsing() {
        assert_eq!("1".parse::<ProcessingLevel>().unwrap(), ProcessingLevel::Level1);
        assert_eq!("LEVEL2".parse::<ProcessingLevel>().unwrap(), ProcessingLevel::Level2);
        assert_eq!("l1".parse::<ProcessingLevel>().unwrap(), ProcessingLevel::Level1);
        assert!("3".parse::<ProcessingLevel>().is_err());
    }

    #[test]
    fn acquisition_dates() {
        let d = parse_acquisition_date("2023-01-05T17:22:40.123Z").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2023, 1, 5).unwrap());
        assert!(matches!(
            parse_acquisition_date("05.01.2023"),
            Err(Error::Record(_))
        ));
        assert!(parse_acquisition_date("").is_err());
    }

    #[test]
    fn centroid_consistency() {
        assert!(record(9.0, 48.3).validate().is_ok());
        assert!(record(10.3, 48.3).validate().is_ok());
        assert!(record(-9.0, 48.3).validate().is_err());
    }
}
