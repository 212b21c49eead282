//! # forcesar Processing
//!
//! Turns discovered scenes into external tool invocations.
//!
//! - `JobBuilder`: clip window, deterministic output path, completion check
//! - `JobDispatcher`: command line assembly and process execution
//! - `BatchRunner`: sequential, failure-isolated processing of a scene list

pub mod batch;
pub mod dispatch;
pub mod error;
pub mod job;
pub mod naming;

pub use batch::{BatchRunner, BatchSummary, JobStatus};
pub use dispatch::{JobDispatcher, ProcessOutput, ProcessRunner, SystemRunner};
pub use error::{ProcessingError, Result};
pub use job::{BuildOutcome, CompletionCheck, FsCompletion, Job, JobBuilder, MemoryCompletion};
pub use naming::output_name;
