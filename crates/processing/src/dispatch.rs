//! External tool invocation.
//!
//! The tool is an opaque command: `{executable} {graph} -P{name}={value}...
//! -q {threads} -c {memory}`. Arguments are passed to the process directly,
//! without a shell, so the WKT clip window needs no quoting. Success is the
//! exit status alone.

use std::process::Stdio;
use std::time::Duration;

use forcesar_core::ProcessingParams;
use tracing::{debug, info, warn};

use crate::error::{ProcessingError, Result};
use crate::job::Job;

/// What a finished process reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Last `n` lines of stderr, for log messages.
    pub fn stderr_tail(&self, n: usize) -> String {
        let lines: Vec<&str> = self.stderr.lines().collect();
        lines[lines.len().saturating_sub(n)..].join("\n")
    }
}

/// Runs external commands.
#[allow(async_fn_in_trait)]
pub trait ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput>;
}

/// Runs commands as child processes of this one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput> {
        let mut command = tokio::process::Command::new(program);
        command.args(args).stdin(Stdio::null()).kill_on_drop(true);

        let output = match timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| ProcessingError::Timeout {
                    program: program.to_string(),
                    timeout: limit,
                })?,
            None => command.output().await,
        }
        .map_err(|source| ProcessingError::Spawn {
            program: program.to_string(),
            source,
        })?;

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Assembles and runs the tool invocation for each job.
pub struct JobDispatcher<R = SystemRunner> {
    runner: R,
    params: ProcessingParams,
}

impl JobDispatcher<SystemRunner> {
    pub fn new(params: ProcessingParams) -> Self {
        Self::with_runner(SystemRunner, params)
    }
}

impl<R: ProcessRunner> JobDispatcher<R> {
    pub fn with_runner(runner: R, params: ProcessingParams) -> Self {
        Self { runner, params }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Program and arguments for `job`.
    pub fn command_line(&self, job: &Job) -> (String, Vec<String>) {
        let p = &self.params;
        let mut args = Vec::with_capacity(job.params.len() + 5);
        args.push(p.graph.clone());
        args.extend(job.params.iter().map(|(k, v)| format!("-P{k}={v}")));
        args.extend(["-q".to_string(), p.threads.clone()]);
        args.extend(["-c".to_string(), p.memory.clone()]);
        (p.executable.clone(), args)
    }

    /// Run `job` to completion and return what the tool reported.
    ///
    /// A non-zero exit is logged and returned, not turned into an error;
    /// errors are reserved for failing to run the tool at all.
    pub async fn dispatch(&self, job: &Job) -> Result<ProcessOutput> {
        let (program, args) = self.command_line(job);
        info!("Processing {} -> {}", job.source, job.output_path.display());
        debug!("{} {}", program, args.join(" "));

        let output = self.runner.run(&program, &args, self.params.timeout).await?;
        if output.success() {
            debug!("{} finished", job.output_path.display());
        } else {
            warn!(
                "{} exited with {:?} for {}: {}",
                program,
                output.code,
                job.source,
                output.stderr_tail(5)
            );
        }
        Ok(output)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::job::tests::params;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Records invocations and answers with a fixed exit code.
    #[derive(Default)]
    pub(crate) struct FakeRunner {
        pub(crate) calls: Mutex<Vec<(String, Vec<String>)>>,
        pub(crate) fail_sources: Vec<String>,
    }

    impl ProcessRunner for FakeRunner {
        async fn run(
            &self,
            program: &str,
            args: &[String],
            _timeout: Option<Duration>,
        ) -> Result<ProcessOutput> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_string(), args.to_vec()));
            let failing = self
                .fail_sources
                .iter()
                .any(|s| args.contains(&format!("-Pinput={s}")));
            Ok(ProcessOutput {
                code: Some(if failing { 1 } else { 0 }),
                stdout: String::new(),
                stderr: if failing { "Error: bad product".into() } else { String::new() },
            })
        }
    }

    fn job() -> Job {
        Job {
            source: "/eodata/a.SAFE".into(),
            output_path: PathBuf::from("/out/20230105_LEVEL2_S1IA_SIG_N0483_E0091.tif"),
            subset_wkt: "POLYGON((9 47.5, 10 47.5, 10 48.5, 9 48.5, 9 47.5))".into(),
            params: BTreeMap::from([
                ("input".to_string(), "/eodata/a.SAFE".to_string()),
                ("output".to_string(), "/out/20230105_LEVEL2_S1IA_SIG_N0483_E0091.tif".to_string()),
                ("subset".to_string(), "POLYGON((9 47.5, 10 47.5, 10 48.5, 9 48.5, 9 47.5))".to_string()),
                ("speckle_filter".to_string(), "Refined Lee".to_string()),
            ]),
        }
    }

    #[test]
    fn command_line_layout() {
        let dispatcher = JobDispatcher::with_runner(FakeRunner::default(), params());
        let (program, args) = dispatcher.command_line(&job());
        assert_eq!(program, "gpt");
        assert_eq!(
            args,
            [
                "/opt/graphs/grd_to_gamma0.xml",
                "-Pinput=/eodata/a.SAFE",
                "-Poutput=/out/20230105_LEVEL2_S1IA_SIG_N0483_E0091.tif",
                "-Pspeckle_filter=Refined Lee",
                "-Psubset=POLYGON((9 47.5, 10 47.5, 10 48.5, 9 48.5, 9 47.5))",
                "-q",
                "8",
                "-c",
                "16G",
            ]
        );
    }

    #[tokio::test]
    async fn non_zero_exit_is_returned() {
        let runner = FakeRunner {
            fail_sources: vec!["/eodata/a.SAFE".into()],
            ..Default::default()
        };
        let dispatcher = JobDispatcher::with_runner(runner, params());
        let output = dispatcher.dispatch(&job()).await.unwrap();
        assert!(!output.success());
        assert_eq!(output.stderr_tail(1), "Error: bad product");
        assert_eq!(dispatcher.runner().calls.lock().unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_runner_reports_exit_code() {
        let out = SystemRunner
            .run("sh", &["-c".into(), "echo hi; exit 3".into()], None)
            .await
            .unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.trim(), "hi");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_runner_times_out() {
        let err = SystemRunner
            .run("sleep", &["5".into()], Some(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Timeout { .. }));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let err = SystemRunner
            .run("forcesar-no-such-tool", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Spawn { .. }));
    }
}
