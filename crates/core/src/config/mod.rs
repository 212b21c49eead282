//! Run configuration
//!
//! The parameter file is read once and turned into an immutable
//! [`RunConfig`] that is passed explicitly to every stage. All values are
//! validated here, before any catalog is contacted.

mod params;

pub use params::{parse_tile_list, read_tile_list, ParameterFile, NULL_VALUE};

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{Error, Result};
use crate::grid::{TileInterval, TileRange};
use crate::scene::{OrbitDirection, ProcessingLevel};

/// Default discovery worker pool size.
pub const DEFAULT_QUERY_THREADS: usize = 4;
/// Default catalog request timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 120;

/// Catalog repository to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repository {
    /// CODE-DE resto catalog (Germany).
    CodeDe,
    /// CREODIAS resto catalog.
    Creodias,
    /// Alaska Satellite Facility search API.
    Asf,
}

impl FromStr for Repository {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().replace(['-', '_'], "").as_str() {
            "CODEDE" => Ok(Self::CodeDe),
            "CREODIAS" => Ok(Self::Creodias),
            "ASF" => Ok(Self::Asf),
            other => Err(Error::config(
                "REPO",
                format!("unknown repository {other:?} (use CODEDE, CREODIAS or ASF)"),
            )),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CodeDe => write!(f, "CODE-DE"),
            Self::Creodias => write!(f, "CREODIAS"),
            Self::Asf => write!(f, "ASF"),
        }
    }
}

/// Catalog-side search settings that do not vary per run stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub satellite: Option<String>,
    pub product_type: Option<String>,
    pub sensor_mode: Option<String>,
    pub processing_level: Option<ProcessingLevel>,
    pub orbit_direction: Option<OrbitDirection>,
    /// Substring the product identifier must contain.
    pub product_pattern: Option<String>,
}

/// Processing tool invocation settings, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingParams {
    pub executable: String,
    /// Processing graph / recipe identifier.
    pub graph: String,
    pub speckle_filter: String,
    pub filter_size: String,
    pub resolution: String,
    pub threads: String,
    pub memory: String,
    pub timeout: Option<Duration>,
}

/// Immutable configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub tiles: TileRange,
    pub grid: PathBuf,
    pub repository: Repository,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Orbits to shard the discovery query by; empty means one query.
    pub orbits: Vec<u32>,
    /// Post-filter orbit allow-list; empty means keep all.
    pub orbit_filter: Vec<u32>,
    pub search: SearchSettings,
    pub query_threads: usize,
    pub query_timeout: Duration,
    pub output_dir: PathBuf,
    pub processing: ProcessingParams,
}

impl RunConfig {
    /// Read a parameter file and build the configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_parameters(&ParameterFile::read(path)?)
    }

    /// Build and validate the configuration from parsed parameters.
    pub fn from_parameters(prm: &ParameterFile) -> Result<Self> {
        let mut tiles = TileRange::new(
            TileInterval::parse("X_TILE_RANGE", prm.require("X_TILE_RANGE")?)?,
            TileInterval::parse("Y_TILE_RANGE", prm.require("Y_TILE_RANGE")?)?,
        );
        if let Some(file) = prm.get("FILE_TILE") {
            let list = read_tile_list(file)?;
            debug!("Tile list {}: {} tiles", file, list.len());
            tiles = tiles.with_allow_list(list);
        }

        let (start_date, end_date) = parse_date_range(prm.require("DATE_RANGE")?)?;

        let repository = prm
            .get("REPO")
            .map(str::parse)
            .transpose()?
            .unwrap_or(Repository::CodeDe);

        let query_threads = prm
            .parse_opt::<usize>("NTHREAD_QUERY")?
            .unwrap_or(DEFAULT_QUERY_THREADS);
        if query_threads == 0 {
            return Err(Error::config("NTHREAD_QUERY", "must be at least 1"));
        }

        let search = SearchSettings {
            satellite: Some(prm.get("SATELLITE").unwrap_or("Sentinel1").to_string()),
            product_type: Some(prm.get("PRODUCT_TYPE").unwrap_or("GRD").to_string()),
            sensor_mode: Some(prm.get("SENSOR_MODE").unwrap_or("IW").to_string()),
            processing_level: Some(
                prm.parse_opt::<ProcessingLevel>("PROCESSING_LEVEL")?
                    .unwrap_or(ProcessingLevel::Level1),
            ),
            orbit_direction: prm.parse_opt::<OrbitDirection>("ORBIT_DIRECTION")?,
            product_pattern: optional_with_default(prm, "PRODUCT_PATTERN", "_IW_GRDH_"),
        };

        let processing = ProcessingParams {
            executable: prm.get("GPT_EXECUTABLE").unwrap_or("gpt").to_string(),
            graph: prm.require("FILE_GRAPH")?.to_string(),
            speckle_filter: prm.require("SPECKLE_FILTER")?.to_string(),
            filter_size: prm.require("FILTER_SIZE")?.to_string(),
            resolution: prm.require("RESOLUTION")?.to_string(),
            threads: prm.require("NTHREAD")?.to_string(),
            memory: prm.require("MEMORY")?.to_string(),
            timeout: prm.parse_opt::<u64>("TIMEOUT_PROCESS")?.map(Duration::from_secs),
        };

        Ok(Self {
            tiles,
            grid: PathBuf::from(prm.require("FORCE_GRID")?),
            repository,
            start_date,
            end_date,
            orbits: prm.parse_list("ORBITS")?,
            orbit_filter: prm.parse_list("ORBIT_FILTER")?,
            search,
            query_threads,
            query_timeout: Duration::from_secs(
                prm.parse_opt::<u64>("TIMEOUT_QUERY")?
                    .unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS),
            ),
            output_dir: PathBuf::from(prm.require("DIR_OUTPUT")?),
            processing,
        })
    }
}

/// A key that defaults when absent but can be disabled with `NULL`.
fn optional_with_default(prm: &ParameterFile, key: &str, default: &str) -> Option<String> {
    match prm.get(key) {
        Some(v) => Some(v.to_string()),
        None if prm.is_null(key) => None,
        None => Some(default.to_string()),
    }
}

/// Parse `"YYYY-MM-DD YYYY-MM-DD"`.
pub fn parse_date_range(value: &str) -> Result<(NaiveDate, NaiveDate)> {
    let dates = value
        .split_whitespace()
        .map(|token| {
            NaiveDate::parse_from_str(token, "%Y-%m-%d")
                .map_err(|_| Error::config("DATE_RANGE", format!("invalid date {token:?}")))
        })
        .collect::<Result<Vec<_>>>()?;
    match dates.as_slice() {
        [start, end] if start <= end => Ok((*start, *end)),
        [start, end] => Err(Error::config(
            "DATE_RANGE",
            format!("start {start} is after end {end}"),
        )),
        _ => Err(Error::config("DATE_RANGE", "expected two dates")),
    }
}
