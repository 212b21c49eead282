//! Orbit-sharded scene discovery.
//!
//! With no orbit list, discovery issues one catalog query. With an orbit
//! list, it issues one query per orbit, at most `concurrency` in flight, and
//! concatenates the shard results in submission order. The first failing
//! shard aborts the whole call.

use std::collections::HashSet;

use forcesar_core::{AreaOfInterest, ProcessingLevel, RunConfig, SceneRecord};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogClient, CatalogOptions};
use crate::error::{CatalogError, Result};
use crate::filters::SearchFilters;

/// Local filters applied after the catalog results are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilters {
    /// Relative orbit allow-list; empty keeps all orbits.
    pub orbits: Vec<u32>,
    /// Substring the product identifier must contain.
    pub product_pattern: Option<String>,
    /// Level the records must have, for backends that cannot filter on it.
    pub processing_level: Option<ProcessingLevel>,
}

impl PostFilters {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            orbits: config.orbit_filter.clone(),
            product_pattern: config.search.product_pattern.clone(),
            processing_level: config.search.processing_level,
        }
    }

    /// Keep records that pass the orbit list and level, touch the AOI and match the pattern.
    pub fn apply(&self, aoi: &AreaOfInterest, records: Vec<SceneRecord>) -> Vec<SceneRecord> {
        let before = records.len();
        let kept: Vec<SceneRecord> = records
            .into_iter()
            .filter(|r| self.orbits.is_empty() || self.orbits.contains(&r.relative_orbit_number))
            .filter(|r| self.processing_level.map_or(true, |l| r.processing_level == l))
            .filter(|r| {
                let touches = aoi.intersects(&r.footprint);
                if !touches {
                    debug!("{} does not intersect the AOI", r.product_identifier);
                }
                touches
            })
            .filter(|r| match &self.product_pattern {
                Some(p) => r.product_identifier.contains(p.as_str()),
                None => true,
            })
            .collect();
        if kept.len() != before {
            info!("Post-filter kept {} of {} records", kept.len(), before);
        }
        kept
    }
}

/// Scene discovery over one catalog client.
pub struct SceneDiscovery<C> {
    client: C,
    concurrency: usize,
}

impl SceneDiscovery<Catalog> {
    /// Discovery against the repository named in `config`.
    pub fn from_config(config: &RunConfig) -> Result<Self> {
        let options = CatalogOptions::default().with_timeout(config.query_timeout);
        let catalog = Catalog::connect(config.repository, options)?;
        Ok(Self::new(catalog, config.query_threads))
    }
}

impl<C: CatalogClient> SceneDiscovery<C> {
    pub fn new(client: C, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Find scenes over `aoi`.
    ///
    /// The query geometry is the AOI convex hull; `post` then filters the
    /// merged records against the exact AOI. A processing level set in
    /// `filters` is enforced locally too, since not every backend honours it.
    /// An empty AOI yields no records without querying.
    pub async fn discover(
        &self,
        aoi: &AreaOfInterest,
        filters: &SearchFilters,
        orbits: &[u32],
        post: &PostFilters,
    ) -> Result<Vec<SceneRecord>> {
        if aoi.is_empty() {
            warn!("Area of interest is empty, check tile ids against the grid");
            return Ok(Vec::new());
        }

        let filters = filters.clone().geometry(aoi.query_polygon());
        let records = if orbits.is_empty() {
            self.client.query(&filters).await?
        } else {
            self.query_sharded(&filters, &shard_orbits(orbits)).await?
        };

        info!(
            "{}: {} records before post-filtering",
            self.client.repository(),
            records.len()
        );
        let post = PostFilters {
            processing_level: post.processing_level.or(filters.processing_level),
            ..post.clone()
        };
        Ok(post.apply(aoi, records))
    }

    async fn query_sharded(
        &self,
        filters: &SearchFilters,
        orbits: &[u32],
    ) -> Result<Vec<SceneRecord>> {
        info!(
            "Querying {} orbit shards ({} concurrent)",
            orbits.len(),
            self.concurrency
        );
        let shards: Vec<Vec<SceneRecord>> = stream::iter(orbits.iter().copied())
            .map(|orbit| {
                let shard = filters.clone().relative_orbit(orbit);
                async move {
                    let records = self.client.query(&shard).await.map_err(|e| {
                        CatalogError::Shard {
                            orbit,
                            source: Box::new(e),
                        }
                    })?;
                    debug!("orbit {}: {} records", orbit, records.len());
                    Ok::<_, CatalogError>(records)
                }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;
        Ok(shards.into_iter().flatten().collect())
    }
}

/// Orbits in first-seen order, without repeats.
fn shard_orbits(orbits: &[u32]) -> Vec<u32> {
    let mut seen = HashSet::new();
    orbits.iter().copied().filter(|o| seen.insert(*o)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use forcesar_core::{OrbitDirection, ProcessingLevel, Repository, TileFeature, TileId};
    use geo::{polygon, MultiPolygon};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns two scenes per orbit; sleeps longer for lower orbits.
    struct FakeCatalog {
        calls: Mutex<Vec<SearchFilters>>,
        fail_orbit: Option<u32>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeCatalog {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_orbit: None,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn failing(orbit: u32) -> Self {
            Self {
                fail_orbit: Some(orbit),
                ..Self::new()
            }
        }

        fn calls(&self) -> Vec<SearchFilters> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CatalogClient for FakeCatalog {
        fn repository(&self) -> Repository {
            Repository::CodeDe
        }

        async fn query(&self, filters: &SearchFilters) -> Result<Vec<SceneRecord>> {
            self.calls.lock().unwrap().push(filters.clone());
            let orbit = filters.relative_orbit.unwrap_or(1);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200 / orbit as u64)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if Some(orbit) == self.fail_orbit {
                return Err(CatalogError::Network("connection reset".into()));
            }
            Ok(vec![
                scene(orbit, "a", 9.5, 48.0),
                scene(orbit, "b", 9.6, 48.1),
            ])
        }
    }

    fn scene(orbit: u32, tag: &str, lon: f64, lat: f64) -> SceneRecord {
        SceneRecord {
            acquisition_date: NaiveDate::from_ymd_opt(2023, 1, 5).unwrap(),
            relative_orbit_number: orbit,
            orbit_direction: OrbitDirection::Ascending,
            product_type: "GRD".into(),
            processing_level: ProcessingLevel::Level1,
            platform: "S1A".into(),
            sensor_mode: "IW".into(),
            centroid_lon: lon,
            centroid_lat: lat,
            product_identifier: format!("S1A_IW_GRDH_1SDV_{orbit:03}_{tag}.SAFE"),
            footprint: polygon![
                (x: lon - 1.0, y: lat - 1.0),
                (x: lon + 1.0, y: lat - 1.0),
                (x: lon + 1.0, y: lat + 1.0),
                (x: lon - 1.0, y: lat + 1.0),
            ],
        }
    }

    fn aoi() -> AreaOfInterest {
        AreaOfInterest::new(vec![TileFeature {
            tile_id: TileId::new(60, 40),
            geometry: MultiPolygon::new(vec![polygon![
                (x: 9.0, y: 48.0), (x: 9.5, y: 48.0), (x: 9.5, y: 48.5), (x: 9.0, y: 48.5)
            ]]),
        }])
        .unwrap()
    }

    #[tokio::test]
    async fn one_query_without_orbits() {
        let discovery = SceneDiscovery::new(FakeCatalog::new(), 4);
        let records = discovery
            .discover(&aoi(), &SearchFilters::new(), &[], &PostFilters::default())
            .await
            .unwrap();
        assert_eq!(records.len(), 2);

        let calls = discovery.client().calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].relative_orbit.is_none());
        assert!(calls[0].geometry.is_some(), "query carries the AOI hull");
    }

    #[tokio::test]
    async fn shards_by_orbit() {
        let discovery = SceneDiscovery::new(FakeCatalog::new(), 2);
        let records = discovery
            .discover(&aoi(), &SearchFilters::new(), &[44, 116], &PostFilters::default())
            .await
            .unwrap();

        let calls = discovery.client().calls();
        assert_eq!(calls.len(), 2);
        let mut queried: Vec<u32> = calls.iter().filter_map(|f| f.relative_orbit).collect();
        queried.sort_unstable();
        assert_eq!(queried, [44, 116]);

        assert_eq!(records.len(), 4);
        assert!(records
            .iter()
            .all(|r| [44, 116].contains(&r.relative_orbit_number)));
        let ids: HashSet<&str> = records.iter().map(|r| r.product_identifier.as_str()).collect();
        assert_eq!(ids.len(), records.len(), "no record appears twice");
    }

    #[tokio::test]
    async fn shard_results_keep_submission_order() {
        // Orbit 2 finishes long after orbit 100.
        let discovery = SceneDiscovery::new(FakeCatalog::new(), 3);
        let records = discovery
            .discover(&aoi(), &SearchFilters::new(), &[2, 100, 50], &PostFilters::default())
            .await
            .unwrap();
        let orbits: Vec<u32> = records.iter().map(|r| r.relative_orbit_number).collect();
        assert_eq!(orbits, [2, 2, 100, 100, 50, 50]);
    }

    #[tokio::test]
    async fn shards_respect_concurrency_limit() {
        let discovery = SceneDiscovery::new(FakeCatalog::new(), 2);
        let records = discovery
            .discover(
                &aoi(),
                &SearchFilters::new(),
                &[1, 2, 3, 4, 5, 6],
                &PostFilters::default(),
            )
            .await
            .unwrap();
        assert_eq!(records.len(), 12);
        assert_eq!(discovery.client().calls().len(), 6);
        let peak = discovery.client().max_in_flight.load(Ordering::SeqCst);
        assert!((1..=2).contains(&peak), "peak of {peak} shards in flight");
    }

    #[tokio::test]
    async fn repeated_orbits_query_once() {
        let discovery = SceneDiscovery::new(FakeCatalog::new(), 1);
        let records = discovery
            .discover(&aoi(), &SearchFilters::new(), &[44, 44], &PostFilters::default())
            .await
            .unwrap();
        assert_eq!(discovery.client().calls().len(), 1);
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn failing_shard_names_its_orbit() {
        let discovery = SceneDiscovery::new(FakeCatalog::failing(116), 2);
        let err = discovery
            .discover(&aoi(), &SearchFilters::new(), &[44, 116], &PostFilters::default())
            .await
            .unwrap_err();
        assert_eq!(err.failed_orbit(), Some(116));
        assert!(err.to_string().contains("116"));
    }

    #[tokio::test]
    async fn empty_aoi_skips_query() {
        let discovery = SceneDiscovery::new(FakeCatalog::new(), 2);
        let records = discovery
            .discover(
                &AreaOfInterest::empty(),
                &SearchFilters::new(),
                &[44],
                &PostFilters::default(),
            )
            .await
            .unwrap();
        assert!(records.is_empty());
        assert!(discovery.client().calls().is_empty());
    }

    #[test]
    fn post_filters() {
        let records = vec![
            scene(44, "a", 9.2, 48.2),
            scene(116, "b", 9.2, 48.2),
            scene(44, "far", 30.0, 10.0),
            SceneRecord {
                product_identifier: "S1A_IW_SLC__1SDV_x.SAFE".into(),
                ..scene(44, "slc", 9.2, 48.2)
            },
        ];
        let post = PostFilters {
            orbits: vec![44],
            product_pattern: Some("_IW_GRDH_".into()),
            processing_level: None,
        };
        let kept = post.apply(&aoi(), records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].product_identifier, "S1A_IW_GRDH_1SDV_044_a.SAFE");
    }

    #[test]
    fn post_filters_apply_processing_level() {
        let records = vec![
            scene(44, "grd", 9.2, 48.2),
            SceneRecord {
                processing_level: ProcessingLevel::Level2,
                ..scene(44, "ocn", 9.2, 48.2)
            },
        ];
        let post = PostFilters {
            processing_level: Some(ProcessingLevel::Level1),
            ..PostFilters::default()
        };
        let kept = post.apply(&aoi(), records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].product_identifier, "S1A_IW_GRDH_1SDV_044_grd.SAFE");
    }

    #[tokio::test]
    async fn query_level_is_enforced_locally() {
        let discovery = SceneDiscovery::new(FakeCatalog::new(), 1);
        let filters = SearchFilters::new().processing_level(ProcessingLevel::Level2);
        let records = discovery
            .discover(&aoi(), &filters, &[], &PostFilters::default())
            .await
            .unwrap();
        assert!(records.is_empty(), "fake catalog only returns level 1 scenes");
    }

    #[test]
    fn shard_orbits_keep_first_seen_order() {
        assert_eq!(shard_orbits(&[116, 44, 116, 7]), [116, 44, 7]);
    }
}
