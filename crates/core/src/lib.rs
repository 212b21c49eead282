//! # forcesar Core
//!
//! Core types for discovering Sentinel-1 scenes over a FORCE tile grid.
//!
//! This crate provides:
//! - `TileRange` / `TileId`: tile grid resolution
//! - `ReferenceGrid` / `AreaOfInterest`: the clipped grid geometry
//! - `SceneRecord`: the canonical scene schema every catalog maps onto
//! - Geometry codecs for WKT, GML coordinate lists and GeoJSON
//! - `RunConfig`: the immutable run configuration

pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod scene;
pub mod vector;

pub use config::{ProcessingParams, Repository, RunConfig, SearchSettings};
pub use error::{Error, Result};
pub use grid::{ReferenceGrid, TileId, TileInterval, TileRange};
pub use scene::{OrbitDirection, ProcessingLevel, SceneRecord};
pub use vector::{AreaOfInterest, TileFeature};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{Repository, RunConfig};
    pub use crate::error::{Error, Result};
    pub use crate::grid::{ReferenceGrid, TileId, TileRange};
    pub use crate::scene::{OrbitDirection, ProcessingLevel, SceneRecord};
    pub use crate::vector::AreaOfInterest;
}
