//! Area of interest: tile features keyed by tile id.

use std::collections::HashSet;

use geo::{BooleanOps, ConvexHull, Intersects, MultiPolygon, Polygon};

use crate::error::{Error, Result};
use crate::geometry::{envelope, polygon_to_wkt};
use crate::grid::TileId;

/// One grid tile with its geometry (EPSG:4326).
#[derive(Debug, Clone)]
pub struct TileFeature {
    pub tile_id: TileId,
    pub geometry: MultiPolygon<f64>,
}

/// Collection of tile features the run is restricted to.
///
/// Tile ids are unique. The union of all tile geometries is computed once
/// on construction and used for every intersection test.
#[derive(Debug, Clone)]
pub struct AreaOfInterest {
    features: Vec<TileFeature>,
    union: MultiPolygon<f64>,
}

impl AreaOfInterest {
    /// Build from tile features, rejecting duplicate ids.
    pub fn new(features: Vec<TileFeature>) -> Result<Self> {
        let mut seen = HashSet::new();
        for f in &features {
            if !seen.insert(f.tile_id.as_str()) {
                return Err(Error::Grid(format!("duplicate tile id {}", f.tile_id)));
            }
        }

        let mut union = MultiPolygon::new(vec![]);
        for f in &features {
            union = union.union(&f.geometry);
        }

        Ok(Self { features, union })
    }

    /// An area with no tiles.
    pub fn empty() -> Self {
        Self {
            features: Vec::new(),
            union: MultiPolygon::new(vec![]),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileFeature> {
        self.features.iter()
    }

    pub fn tile_ids(&self) -> impl Iterator<Item = &TileId> {
        self.features.iter().map(|f| &f.tile_id)
    }

    /// Union of all tile geometries (full, possibly multi-part).
    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.union
    }

    /// Convex hull of the area, the only shape catalogs accept in queries.
    pub fn query_polygon(&self) -> Polygon<f64> {
        self.union.convex_hull()
    }

    /// Whether a scene footprint touches the (non-hull) area.
    pub fn intersects(&self, footprint: &Polygon<f64>) -> bool {
        footprint.intersects(&self.union)
    }

    /// Envelope of the area clipped to `footprint`, `None` when they do not overlap.
    pub fn subset_envelope(&self, footprint: &Polygon<f64>) -> Option<Polygon<f64>> {
        let clipped = self
            .union
            .intersection(&MultiPolygon::new(vec![footprint.clone()]));
        envelope(&clipped)
    }

    /// WKT of [`Self::subset_envelope`].
    pub fn subset_wkt(&self, footprint: &Polygon<f64>) -> Option<String> {
        self.subset_envelope(footprint).map(|p| polygon_to_wkt(&p))
    }
}

impl<'a> IntoIterator for &'a AreaOfInterest {
    type Item = &'a TileFeature;
    type IntoIter = std::slice::Iter<'a, TileFeature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
