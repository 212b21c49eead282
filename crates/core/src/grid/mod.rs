//! Tile grid resolution
//!
//! Turns tile coordinate ranges (and an optional explicit tile list) into
//! the set of tile identifiers, then clips a reference grid to that set.
//!
//! Tile ids follow the FORCE convention `X####_Y####`. Explicit lists are
//! matched by exact string comparison: an id with different padding or
//! separator simply never matches, and the area of interest ends up empty.

mod reference;

pub use reference::{ReferenceGrid, TILE_ID_FIELD};

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::error::{Error, Result};

/// A FORCE tile identifier, e.g. `X0060_Y0040`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId(String);

impl TileId {
    /// Build the zero-padded id for grid cell (`x`, `y`).
    pub fn new(x: u32, y: u32) -> Self {
        Self(format!("X{x:04}_Y{y:04}"))
    }

    /// Wrap an id read from a grid dataset or tile list, without validation.
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id has the canonical `X####_Y####` shape.
    pub fn is_canonical(&self) -> bool {
        let b = self.0.as_bytes();
        b.len() == 11
            && b[0] == b'X'
            && b[5] == b'_'
            && b[6] == b'Y'
            && b[1..5].iter().all(u8::is_ascii_digit)
            && b[7..11].iter().all(u8::is_ascii_digit)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed integer interval of tile indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileInterval {
    pub min: u32,
    pub max: u32,
}

impl TileInterval {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Parse `"min max"` (or a single value). `key` names the parameter in errors.
    pub fn parse(key: &str, value: &str) -> Result<Self> {
        let bounds = value
            .split_whitespace()
            .map(|token| {
                token.parse::<u32>().map_err(|_| {
                    Error::config(key, format!("non-numeric tile index {token:?}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        match bounds.as_slice() {
            [single] => Ok(Self::new(*single, *single)),
            [min, max] => Ok(Self::new(*min, *max)),
            [] => Err(Error::config(key, "empty tile range")),
            _ => Err(Error::config(
                key,
                format!("expected 'min max', got {} values", bounds.len()),
            )),
        }
    }

    /// Number of indices; zero when `min > max`.
    pub fn len(&self) -> usize {
        if self.min > self.max {
            0
        } else {
            (self.max - self.min) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Tile ranges plus an optional explicit allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRange {
    pub x: TileInterval,
    pub y: TileInterval,
    pub allow_list: Option<Vec<String>>,
}

impl TileRange {
    pub fn new(x: TileInterval, y: TileInterval) -> Self {
        Self {
            x,
            y,
            allow_list: None,
        }
    }

    /// Restrict the range to the given tile ids.
    pub fn with_allow_list(mut self, tiles: Vec<String>) -> Self {
        self.allow_list = Some(tiles);
        self
    }

    /// Resolve to the set of tile ids.
    ///
    /// The Cartesian product of both intervals, intersected with the
    /// allow-list when one is present. An empty interval yields an empty set.
    pub fn resolve(&self) -> BTreeSet<TileId> {
        let allowed: Option<HashSet<&str>> = self
            .allow_list
            .as_ref()
            .map(|list| list.iter().map(String::as_str).collect());

        (self.x.min..=self.x.max)
            .flat_map(|x| (self.y.min..=self.y.max).map(move |y| TileId::new(x, y)))
            .filter(|id| {
                allowed
                    .as_ref()
                    .map_or(true, |set| set.contains(id.as_str()))
            })
            .collect()
    }
}
