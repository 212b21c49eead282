//! Per-scene job construction.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use forcesar_core::{AreaOfInterest, ProcessingParams, SceneRecord};
use tracing::debug;

use crate::naming::output_name;

/// Decides whether an output already exists.
pub trait CompletionCheck {
    fn is_complete(&self, path: &Path) -> bool;
}

/// Completion is the existence of the output file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCompletion;

impl CompletionCheck for FsCompletion {
    fn is_complete(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// In-memory set of completed outputs.
#[derive(Debug, Default)]
pub struct MemoryCompletion {
    done: Mutex<HashSet<PathBuf>>,
}

impl MemoryCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_complete(&self, path: impl Into<PathBuf>) {
        if let Ok(mut done) = self.done.lock() {
            done.insert(path.into());
        }
    }
}

impl CompletionCheck for MemoryCompletion {
    fn is_complete(&self, path: &Path) -> bool {
        self.done.lock().map(|d| d.contains(path)).unwrap_or(false)
    }
}

impl<T: CompletionCheck + ?Sized> CompletionCheck for &T {
    fn is_complete(&self, path: &Path) -> bool {
        (**self).is_complete(path)
    }
}

/// One external tool invocation for one scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Source product locator.
    pub source: String,
    pub output_path: PathBuf,
    /// Envelope of AOI ∩ footprint as WKT.
    pub subset_wkt: String,
    /// Named tool parameters, passed as `-P{name}={value}`.
    pub params: BTreeMap<String, String>,
}

/// Result of [`JobBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Work to do.
    Job(Job),
    /// The output already exists.
    Skip { output_path: PathBuf },
    /// The footprint does not overlap the AOI, so there is no clip window.
    NoOverlap { source: String },
}

impl BuildOutcome {
    pub fn job(&self) -> Option<&Job> {
        match self {
            Self::Job(job) => Some(job),
            _ => None,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip { .. })
    }
}

/// Builds jobs for scenes against one AOI and output directory.
#[derive(Debug, Clone)]
pub struct JobBuilder<K = FsCompletion> {
    output_dir: PathBuf,
    params: ProcessingParams,
    completion: K,
}

impl JobBuilder<FsCompletion> {
    pub fn new(output_dir: impl Into<PathBuf>, params: ProcessingParams) -> Self {
        Self::with_completion(output_dir, params, FsCompletion)
    }
}

impl<K: CompletionCheck> JobBuilder<K> {
    pub fn with_completion(
        output_dir: impl Into<PathBuf>,
        params: ProcessingParams,
        completion: K,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            params,
            completion,
        }
    }

    pub fn params(&self) -> &ProcessingParams {
        &self.params
    }

    pub fn completion(&self) -> &K {
        &self.completion
    }

    /// Output path for `scene`.
    pub fn output_path(&self, scene: &SceneRecord) -> PathBuf {
        self.output_dir.join(output_name(scene))
    }

    /// Build the job for `scene`, or report why there is none.
    pub fn build(&self, scene: &SceneRecord, aoi: &AreaOfInterest) -> BuildOutcome {
        let output_path = self.output_path(scene);
        if self.completion.is_complete(&output_path) {
            debug!("{} exists, skipping", output_path.display());
            return BuildOutcome::Skip { output_path };
        }

        let Some(subset_wkt) = aoi.subset_wkt(&scene.footprint) else {
            debug!("{} does not overlap the AOI", scene.product_identifier);
            return BuildOutcome::NoOverlap {
                source: scene.product_identifier.clone(),
            };
        };

        let p = &self.params;
        let params = BTreeMap::from([
            ("input".to_string(), scene.product_identifier.clone()),
            ("output".to_string(), output_path.display().to_string()),
            ("subset".to_string(), subset_wkt.clone()),
            ("speckle_filter".to_string(), p.speckle_filter.clone()),
            ("filter_size".to_string(), p.filter_size.clone()),
            ("resolution".to_string(), p.resolution.clone()),
        ]);

        BuildOutcome::Job(Job {
            source: scene.product_identifier.clone(),
            output_path,
            subset_wkt,
            params,
        })
    }
}
