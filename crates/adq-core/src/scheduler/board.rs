//! The job table and batch bookkeeping, guarded by the scheduler's mutex.

use chrono::Utc;
use std::collections::HashSet;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::job::{normalize_source, same_source, Job, JobId, JobState};
use crate::runner::{JobEvent, JobTicket, JobUpdate, RunnerError};

use super::error::SchedulerError;
use super::stats::{self, AggregateStats};
use super::types::{BatchSnapshot, BatchState, BatchSummary, ErrorLogEntry, SubmitReport};

pub(super) struct Board {
    jobs: Vec<Job>,
    next_id: u64,
    state: BatchState,
    cancellation_requested: bool,
    cancel: CancellationToken,
    members: HashSet<JobId>,
    total_count: usize,
    processed_count: usize,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    error_log: Vec<ErrorLogEntry>,
}

impl Board {
    pub(super) fn new() -> Self {
        Self {
            jobs: Vec::new(),
            next_id: 1,
            state: BatchState::Idle,
            cancellation_requested: false,
            cancel: CancellationToken::new(),
            members: HashSet::new(),
            total_count: 0,
            processed_count: 0,
            started_at: None,
            finished_at: None,
            error_log: Vec::new(),
        }
    }

    pub(super) fn state(&self) -> BatchState {
        self.state
    }

    pub(super) fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub(super) fn error_log(&self) -> &[ErrorLogEntry] {
        &self.error_log
    }

    pub(super) fn can_start(&self) -> bool {
        self.state != BatchState::Running && self.jobs.iter().any(|j| j.state().is_eligible())
    }

    pub(super) fn can_stop(&self) -> bool {
        self.state == BatchState::Running && !self.cancellation_requested
    }

    /// Adds well-formed, not-yet-managed URLs. While a batch runs, new jobs
    /// join it as `Queued`; otherwise they wait as `Pending`.
    pub(super) fn submit<I, S>(&mut self, urls: I) -> SubmitReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = SubmitReport::default();
        for raw in urls {
            let raw = raw.as_ref();
            let Some(url) = normalize_source(raw) else {
                report.rejected.push(raw.trim().to_string());
                continue;
            };
            if self.jobs.iter().any(|j| same_source(j.url(), &url)) {
                report.duplicates.push(url);
                continue;
            }

            let id = JobId(self.next_id);
            self.next_id += 1;
            let mut job = Job::new(id, url);
            if self.state == BatchState::Running {
                job.enqueue();
                self.members.insert(id);
                self.total_count += 1;
            }
            self.jobs.push(job);
            report.added.push(id);
        }
        report
    }

    /// Resets eligible jobs to `Queued` and opens a new batch over them.
    pub(super) fn begin(&mut self, now: Instant) -> Result<CancellationToken, SchedulerError> {
        if self.state == BatchState::Running {
            return Err(SchedulerError::InvalidState(self.state));
        }
        let eligible: HashSet<JobId> = self
            .jobs
            .iter()
            .filter(|j| j.state().is_eligible())
            .map(|j| j.id())
            .collect();
        if eligible.is_empty() {
            return Err(SchedulerError::NoWork);
        }

        for job in self.jobs.iter_mut().filter(|j| eligible.contains(&j.id())) {
            job.enqueue();
        }
        self.total_count = eligible.len();
        self.members = eligible;
        self.processed_count = 0;
        self.started_at = Some(now);
        self.finished_at = None;
        self.error_log.clear();
        self.cancellation_requested = false;
        self.cancel = CancellationToken::new();
        self.state = BatchState::Running;
        Ok(self.cancel.clone())
    }

    /// Flags cancellation and fires the batch token. False if nothing to do.
    pub(super) fn request_stop(&mut self) -> bool {
        if !self.can_stop() {
            return false;
        }
        self.cancellation_requested = true;
        self.cancel.cancel();
        true
    }

    /// Moves the earliest-submitted `Queued` job to `Downloading`.
    pub(super) fn claim_next_queued(&mut self) -> Option<JobTicket> {
        let job = self
            .jobs
            .iter_mut()
            .find(|j| j.state() == JobState::Queued)?;
        job.begin();
        Some(JobTicket {
            id: job.id(),
            url: job.url().to_string(),
        })
    }

    pub(super) fn apply(&mut self, event: JobEvent) {
        let Some(job) = self.jobs.iter_mut().find(|j| j.id() == event.job_id) else {
            return;
        };
        match event.update {
            JobUpdate::Progress(percent) => job.record_progress(percent),
            JobUpdate::Status(text) => job.record_status(text),
        }
    }

    /// Applies a runner's result. Counts the job as processed exactly once.
    pub(super) fn finish(
        &mut self,
        id: JobId,
        result: Result<(), RunnerError>,
    ) -> Option<(JobState, String)> {
        let job = self
            .jobs
            .iter_mut()
            .find(|j| j.id() == id && j.state() == JobState::Downloading)?;
        match result {
            Ok(()) => job.complete(),
            Err(RunnerError::Cancelled) => job.stop(),
            Err(e) => {
                let message = e.to_string();
                job.fail(message.clone());
                self.error_log.push(ErrorLogEntry {
                    job_id: id,
                    url: job.url().to_string(),
                    at: Utc::now(),
                    message,
                });
            }
        }
        self.processed_count += 1;
        Some((job.state(), job.url().to_string()))
    }

    /// Closes the batch once no runner is left. Never-started jobs of a
    /// cancelled batch end `Stopped`.
    ///
    /// Returns false, changing nothing, when the batch is not cancelled and a
    /// job submitted late is still waiting for admission.
    pub(super) fn settle(&mut self, cancelled: bool, now: Instant) -> bool {
        if !cancelled && self.has_queued_member() {
            return false;
        }
        for job in self
            .jobs
            .iter_mut()
            .filter(|j| self.members.contains(&j.id()))
        {
            match job.state() {
                JobState::Queued if cancelled => job.stop(),
                // Runner task vanished without reporting; should not happen.
                JobState::Downloading => job.fail("runner ended without reporting a result"),
                _ => continue,
            }
            self.processed_count += 1;
        }
        self.close(cancelled, now);
        true
    }

    /// Ends a batch whose driver went away mid-run. Every unfinished member
    /// is stopped; the runners themselves are already gone.
    pub(super) fn abandon(&mut self, now: Instant) {
        if self.state != BatchState::Running {
            return;
        }
        self.cancellation_requested = true;
        self.cancel.cancel();
        for job in self
            .jobs
            .iter_mut()
            .filter(|j| self.members.contains(&j.id()))
        {
            if matches!(job.state(), JobState::Queued | JobState::Downloading) {
                job.stop();
                self.processed_count += 1;
            }
        }
        self.close(true, now);
    }

    fn has_queued_member(&self) -> bool {
        self.jobs
            .iter()
            .any(|j| j.state() == JobState::Queued && self.members.contains(&j.id()))
    }

    fn close(&mut self, cancelled: bool, now: Instant) {
        self.state = if cancelled {
            BatchState::Cancelled
        } else {
            BatchState::Completed
        };
        self.finished_at = Some(now);
    }

    /// Removes a job while no batch runs.
    pub(super) fn remove(&mut self, id: JobId) -> bool {
        if self.state == BatchState::Running {
            return false;
        }
        let before = self.jobs.len();
        self.jobs.retain(|j| j.id() != id);
        self.jobs.len() != before
    }

    /// Drops every `Completed` job while no batch runs.
    pub(super) fn clear_finished(&mut self) -> usize {
        if self.state == BatchState::Running {
            return 0;
        }
        let before = self.jobs.len();
        self.jobs.retain(|j| j.state() != JobState::Completed);
        before - self.jobs.len()
    }

    pub(super) fn stats(&self, now: Instant) -> AggregateStats {
        if self.started_at.is_none() {
            return AggregateStats::empty();
        }
        stats::compute(
            self.jobs.iter().filter(|j| self.members.contains(&j.id())),
            self.processed_count,
            self.total_count,
            stats::elapsed(self.started_at, self.finished_at, now),
        )
    }

    pub(super) fn snapshot(&self, now: Instant) -> BatchSnapshot {
        BatchSnapshot {
            state: self.state,
            cancellation_requested: self.cancellation_requested,
            jobs: self.jobs.clone(),
            stats: self.stats(now),
        }
    }

    pub(super) fn summary(&self, now: Instant) -> BatchSummary {
        let count = |state: JobState| {
            self.jobs
                .iter()
                .filter(|j| self.members.contains(&j.id()) && j.state() == state)
                .count()
        };
        BatchSummary {
            state: self.state,
            completed: count(JobState::Completed),
            failed: count(JobState::Failed),
            stopped: count(JobState::Stopped),
            processed: self.processed_count,
            total: self.total_count,
            elapsed: stats::elapsed(self.started_at, self.finished_at, now),
        }
    }
}
