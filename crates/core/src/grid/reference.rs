//! Reference tile grid loaded from GeoJSON.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use geo::{CoordsIter, MultiPolygon};
use serde_json::Value;
use tracing::{debug, info};

use super::TileId;
use crate::error::{Error, Result};
use crate::geometry::multipolygon_from_geojson;
use crate::vector::{AreaOfInterest, TileFeature};

/// Attribute holding the tile identifier.
pub const TILE_ID_FIELD: &str = "Tile_ID";

/// The full tile grid, one feature per tile, geometries in lon/lat.
#[derive(Debug, Clone, Default)]
pub struct ReferenceGrid {
    tiles: Vec<TileFeature>,
}

impl ReferenceGrid {
    /// Parse a GeoJSON FeatureCollection.
    ///
    /// Every feature needs a string `Tile_ID` property and a (Multi)Polygon
    /// geometry in lon/lat; duplicate ids are rejected. A legacy `crs` member
    /// naming anything but CRS84 / EPSG:4326 is rejected, as is any vertex
    /// outside [-180, 180] x [-90, 90].
    pub fn from_geojson_str(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text)?;
        check_crs(&root)?;
        let features = root
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Grid("expected a GeoJSON FeatureCollection".into()))?;

        let mut seen = HashSet::new();
        let mut tiles = Vec::with_capacity(features.len());
        for (idx, feature) in features.iter().enumerate() {
            let id = feature
                .get("properties")
                .and_then(|p| p.get(TILE_ID_FIELD))
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    Error::Grid(format!("feature {idx} has no string {TILE_ID_FIELD}"))
                })?;
            if !seen.insert(id.to_string()) {
                return Err(Error::Grid(format!("duplicate tile id {id}")));
            }
            let geometry = feature
                .get("geometry")
                .ok_or_else(|| Error::Grid(format!("tile {id} has no geometry")))?;
            let geometry = multipolygon_from_geojson(geometry)?;
            check_lon_lat(id, &geometry)?;
            tiles.push(TileFeature {
                tile_id: TileId::from_raw(id),
                geometry,
            });
        }

        Ok(Self { tiles })
    }

    /// Read a GeoJSON grid file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let grid = Self::from_geojson_str(&text)?;
        info!("Reference grid {}: {} tiles", path.display(), grid.len());
        Ok(grid)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileFeature> {
        self.tiles.iter()
    }

    /// Keep only the tiles in `wanted`, producing the area of interest.
    ///
    /// Ids missing from the grid are dropped silently; the result may be empty.
    pub fn clip(&self, wanted: &BTreeSet<TileId>) -> Result<AreaOfInterest> {
        let features: Vec<TileFeature> = self
            .tiles
            .iter()
            .filter(|t| wanted.contains(&t.tile_id))
            .cloned()
            .collect();
        debug!(
            "Clipped grid to {} of {} requested tiles",
            features.len(),
            wanted.len()
        );
        AreaOfInterest::new(features)
    }
}

/// Reject a named CRS other than WGS 84 lon/lat.
fn check_crs(root: &Value) -> Result<()> {
    let Some(crs) = root.get("crs") else {
        return Ok(());
    };
    let name = crs
        .pointer("/properties/name")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let upper = name.to_uppercase();
    let lon_lat = upper.ends_with("CRS84")
        || upper.ends_with("EPSG::4326")
        || upper.ends_with("EPSG:4326");
    if !lon_lat {
        return Err(Error::Grid(format!(
            "grid must be in lon/lat (EPSG:4326), found crs {name:?}"
        )));
    }
    Ok(())
}

fn check_lon_lat(id: &str, geometry: &MultiPolygon<f64>) -> Result<()> {
    match geometry
        .coords_iter()
        .find(|c| !(-180.0..=180.0).contains(&c.x) || !(-90.0..=90.0).contains(&c.y))
    {
        Some(c) => Err(Error::Grid(format!(
            "tile {id} has vertex ({}, {}) outside lon/lat range, reproject the grid to EPSG:4326",
            c.x, c.y
        ))),
        None => Ok(()),
    }
}
