//! Job runners: execute one job to a terminal outcome.
//!
//! The scheduler hands a runner a [`JobTicket`], the batch [`RunSettings`], a
//! [`JobReporter`] for progress/status updates, and the batch cancellation
//! token. The runner never touches batch state; everything goes upward through
//! the reporter and its return value.

mod args;
mod error;
mod probe;
mod terminate;
mod tool;

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::job::JobId;

pub use args::{build_args, Quality, DEFAULT_AUDIO_FORMAT, OUTPUT_TEMPLATE};
pub use error::RunnerError;
pub use probe::{probe_tools, ToolProbe};
pub use tool::ToolRunner;

/// The part of a job a runner is allowed to see.
#[derive(Debug, Clone)]
pub struct JobTicket {
    pub id: JobId,
    pub url: String,
}

/// Settings shared by every job of a batch.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub output_dir: PathBuf,
    pub quality: Quality,
    pub audio_format: String,
    /// Extra tool arguments, placed before the URL.
    pub extra_args: Vec<String>,
}

impl RunSettings {
    pub fn new(output_dir: impl Into<PathBuf>, quality: Quality) -> Self {
        Self {
            output_dir: output_dir.into(),
            quality,
            audio_format: DEFAULT_AUDIO_FORMAT.to_string(),
            extra_args: Vec::new(),
        }
    }
}

/// An update a runner reports for the job it owns.
#[derive(Debug, Clone, PartialEq)]
pub enum JobUpdate {
    Progress(f64),
    Status(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobEvent {
    pub job_id: JobId,
    pub update: JobUpdate,
}

/// Sends progress and status for one job to whoever owns the job table.
#[derive(Debug, Clone)]
pub struct JobReporter {
    job_id: JobId,
    tx: mpsc::UnboundedSender<JobEvent>,
}

impl JobReporter {
    pub fn new(job_id: JobId, tx: mpsc::UnboundedSender<JobEvent>) -> Self {
        Self { job_id, tx }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn progress(&self, percent: f64) {
        self.send(JobUpdate::Progress(percent));
    }

    pub fn status(&self, text: impl Into<String>) {
        self.send(JobUpdate::Status(text.into()));
    }

    // The receiver only goes away once the batch is over; late updates are moot.
    fn send(&self, update: JobUpdate) {
        let _ = self.tx.send(JobEvent {
            job_id: self.job_id,
            update,
        });
    }
}

/// Runs a single job to completion.
///
/// `Ok(())` means the job completed. `Err(RunnerError::Cancelled)` means the
/// token fired before or during the run; any other error fails the job.
#[async_trait]
pub trait JobRunner: Send + Sync + 'static {
    async fn run(
        &self,
        job: &JobTicket,
        settings: &RunSettings,
        reporter: &JobReporter,
        cancel: &CancellationToken,
    ) -> Result<(), RunnerError>;
}
