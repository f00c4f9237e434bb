//! Public views of the scheduler: batch state, snapshots, reports.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

use crate::job::{Job, JobId, JobState};

use super::stats::AggregateStats;

/// Batch-level state machine: `Idle → Running → (Completed | Cancelled)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl BatchState {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchState::Idle => "idle",
            BatchState::Running => "running",
            BatchState::Completed => "completed",
            BatchState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BatchState::Completed | BatchState::Cancelled)
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only copy of everything an observer may show.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSnapshot {
    pub state: BatchState,
    pub cancellation_requested: bool,
    /// All managed jobs, in submission order.
    pub jobs: Vec<Job>,
    pub stats: AggregateStats,
}

impl BatchSnapshot {
    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id() == id)
    }

    pub fn count_in(&self, state: JobState) -> usize {
        self.jobs.iter().filter(|j| j.state() == state).count()
    }
}

/// Outcome of `submit`: which URLs became jobs and which were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReport {
    pub added: Vec<JobId>,
    /// Already managed (case-insensitive match), or repeated in the same call.
    pub duplicates: Vec<String>,
    /// Not an absolute http(s) URL.
    pub rejected: Vec<String>,
}

/// One failed job, kept for caller inspection until the next `start()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLogEntry {
    pub job_id: JobId,
    pub url: String,
    pub at: DateTime<Utc>,
    pub message: String,
}

/// What `start()` resolves to once the batch is terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub state: BatchState,
    pub completed: usize,
    pub failed: usize,
    pub stopped: usize,
    pub processed: usize,
    pub total: usize,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn all_completed(&self) -> bool {
        self.state == BatchState::Completed && self.completed == self.total
    }
}
