//! # forcesar Cloud
//!
//! Scene metadata search against Sentinel-1 catalogs.
//!
//! This crate provides:
//! - `RestoClient`: CODE-DE and CREODIAS resto search (GML footprints, paging)
//! - `AsfClient`: ASF search (GeoJSON footprints)
//! - `SceneDiscovery`: orbit-sharded, bounded-concurrency discovery with
//!   local post-filtering against the area of interest
//!
//! Every backend maps its response onto [`forcesar_core::SceneRecord`].

pub mod asf;
pub mod catalog;
mod de;
pub mod discovery;
pub mod error;
pub mod filters;
pub mod resto;

pub use asf::AsfClient;
pub use catalog::{Catalog, CatalogClient, CatalogOptions};
pub use discovery::{PostFilters, SceneDiscovery};
pub use error::{CatalogError, Result};
pub use filters::SearchFilters;
pub use resto::RestoClient;
