//! Sequential batch over discovered scenes.
//!
//! Jobs run one at a time. A failing job is recorded and the batch moves on;
//! nothing short of the caller dropping the future stops it.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use forcesar_core::{AreaOfInterest, SceneRecord};
use tracing::{error, info};

use crate::dispatch::{JobDispatcher, ProcessRunner};
use crate::job::{BuildOutcome, CompletionCheck, JobBuilder};

/// What happened to one scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Succeeded { output_path: PathBuf },
    Failed { output_path: PathBuf, code: Option<i32> },
    /// The tool could not be run (missing executable, timeout).
    Error { output_path: PathBuf, reason: String },
    /// Dry run: the job would have been dispatched.
    Planned { output_path: PathBuf },
    /// Output already exists from an earlier run.
    SkippedExisting { output_path: PathBuf },
    /// An earlier scene in this batch maps to the same output.
    SkippedDuplicate { output_path: PathBuf },
    NoOverlap,
}

/// Per-status counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub scenes: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: usize,
    pub planned: usize,
    pub skipped_existing: usize,
    pub skipped_duplicate: usize,
    pub no_overlap: usize,
}

impl BatchSummary {
    fn record(&mut self, status: &JobStatus) {
        self.scenes += 1;
        match status {
            JobStatus::Succeeded { .. } => self.succeeded += 1,
            JobStatus::Failed { .. } => self.failed += 1,
            JobStatus::Error { .. } => self.errors += 1,
            JobStatus::Planned { .. } => self.planned += 1,
            JobStatus::SkippedExisting { .. } => self.skipped_existing += 1,
            JobStatus::SkippedDuplicate { .. } => self.skipped_duplicate += 1,
            JobStatus::NoOverlap => self.no_overlap += 1,
        }
    }

    /// Jobs that were attempted and did not succeed.
    pub fn failures(&self) -> usize {
        self.failed + self.errors
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scenes: {} succeeded, {} failed, {} planned, {} already done, {} duplicate, {} outside AOI",
            self.scenes,
            self.succeeded,
            self.failures(),
            self.planned,
            self.skipped_existing,
            self.skipped_duplicate,
            self.no_overlap
        )
    }
}

/// Builds and dispatches one job per scene.
pub struct BatchRunner<'a, K, R> {
    builder: &'a JobBuilder<K>,
    dispatcher: &'a JobDispatcher<R>,
    dry_run: bool,
}

impl<'a, K: CompletionCheck, R: ProcessRunner> BatchRunner<'a, K, R> {
    pub fn new(builder: &'a JobBuilder<K>, dispatcher: &'a JobDispatcher<R>) -> Self {
        Self {
            builder,
            dispatcher,
            dry_run: false,
        }
    }

    /// Build jobs but do not run the tool.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Process `scenes` in order, reporting each status to `on_status`.
    pub async fn run<F>(
        &self,
        scenes: &[SceneRecord],
        aoi: &AreaOfInterest,
        mut on_status: F,
    ) -> BatchSummary
    where
        F: FnMut(&SceneRecord, &JobStatus),
    {
        let mut summary = BatchSummary::default();
        let mut claimed: HashSet<PathBuf> = HashSet::new();

        for scene in scenes {
            let status = self.process(scene, aoi, &mut claimed).await;
            summary.record(&status);
            on_status(scene, &status);
        }

        info!("Batch finished: {}", summary);
        summary
    }

    async fn process(
        &self,
        scene: &SceneRecord,
        aoi: &AreaOfInterest,
        claimed: &mut HashSet<PathBuf>,
    ) -> JobStatus {
        let job = match self.builder.build(scene, aoi) {
            BuildOutcome::Job(job) => job,
            BuildOutcome::Skip { output_path } => return JobStatus::SkippedExisting { output_path },
            BuildOutcome::NoOverlap { .. } => return JobStatus::NoOverlap,
        };

        if !claimed.insert(job.output_path.clone()) {
            info!(
                "{} maps to {}, already handled in this run",
                job.source,
                job.output_path.display()
            );
            return JobStatus::SkippedDuplicate {
                output_path: job.output_path,
            };
        }

        if self.dry_run {
            let (program, args) = self.dispatcher.command_line(&job);
            info!("[dry run] {} {}", program, args.join(" "));
            return JobStatus::Planned {
                output_path: job.output_path,
            };
        }

        match self.dispatcher.dispatch(&job).await {
            Ok(output) if output.success() => JobStatus::Succeeded {
                output_path: job.output_path,
            },
            Ok(output) => JobStatus::Failed {
                output_path: job.output_path,
                code: output.code,
            },
            Err(e) => {
                error!("{}: {}", job.source, e);
                JobStatus::Error {
                    output_path: job.output_path,
                    reason: e.to_string(),
                }
            }
        }
    }
}
