//! Job record and lifecycle states.

use std::fmt;

/// Status text shown for a job nothing has happened to yet.
pub const IDLE_STATUS: &str = "Idle";

/// Job identifier, assigned in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a single job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Queued,
    Downloading,
    Completed,
    Failed,
    Stopped,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Queued => "queued",
            JobState::Downloading => "downloading",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Stopped => "stopped",
        }
    }

    /// No further automatic transition happens from these states.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Stopped
        )
    }

    /// States picked up (and reset to `Queued`) by the next batch start.
    pub fn is_eligible(self) -> bool {
        matches!(
            self,
            JobState::Pending | JobState::Queued | JobState::Failed | JobState::Stopped
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamps a percentage into `[0, 100]`; NaN becomes 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// One URL's download-and-convert unit of work.
///
/// Fields are read through accessors; mutation goes through the transition
/// methods so the progress invariants hold for every observer.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    id: JobId,
    url: String,
    state: JobState,
    progress: f64,
    status_message: String,
    error_message: String,
}

impl Job {
    pub fn new(id: JobId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            state: JobState::Pending,
            progress: 0.0,
            status_message: IDLE_STATUS.to_string(),
            error_message: String::new(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Percentage in `[0, 100]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Non-empty only when the job is `Failed`.
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Progress as counted by the batch average: terminal jobs count as done.
    pub fn effective_progress(&self) -> f64 {
        if self.is_terminal() {
            100.0
        } else {
            self.progress
        }
    }

    /// Puts the job in line for admission with a clean slate.
    pub(crate) fn enqueue(&mut self) {
        self.state = JobState::Queued;
        self.progress = 0.0;
        self.error_message.clear();
        self.status_message = "Queued".to_string();
    }

    pub(crate) fn begin(&mut self) {
        self.state = JobState::Downloading;
        self.progress = 0.0;
        self.status_message = "Starting".to_string();
    }

    /// Records a progress sample. Ignored unless downloading; never moves backwards.
    pub(crate) fn record_progress(&mut self, percent: f64) {
        if self.state != JobState::Downloading {
            return;
        }
        self.progress = self.progress.max(clamp_percent(percent));
    }

    pub(crate) fn record_status(&mut self, status: impl Into<String>) {
        if self.state == JobState::Downloading {
            self.status_message = status.into();
        }
    }

    pub(crate) fn complete(&mut self) {
        self.state = JobState::Completed;
        self.progress = 100.0;
        self.status_message = "Completed".to_string();
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.state = JobState::Failed;
        self.error_message = message.into();
        self.status_message = "Failed".to_string();
    }

    pub(crate) fn stop(&mut self) {
        self.state = JobState::Stopped;
        self.progress = 0.0;
        self.error_message.clear();
        self.status_message = "Stopped".to_string();
    }
}
