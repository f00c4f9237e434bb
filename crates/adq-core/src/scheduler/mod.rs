//! Batch scheduler.
//!
//! Owns the job collection, admits `Queued` jobs FIFO into a bounded pool of
//! runners, aggregates progress, and broadcasts one cancellation signal to
//! every in-flight runner on `stop()`. Observers poll [`Scheduler::snapshot`]
//! or subscribe to the watch channel from [`Scheduler::subscribe`].

mod admission;
mod board;
mod error;
mod stats;
mod types;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

use crate::job::{Job, JobId};
use crate::runner::{JobRunner, RunSettings};

use self::board::Board;

pub use error::SchedulerError;
pub use stats::AggregateStats;
pub use types::{BatchSnapshot, BatchState, BatchSummary, ErrorLogEntry, SubmitReport};

/// Jobs downloading at once unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 3;

/// Cheap to clone; clones share the same batch.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

struct Inner {
    runner: Arc<dyn JobRunner>,
    settings: RunSettings,
    capacity: usize,
    board: Mutex<Board>,
    snapshots: watch::Sender<BatchSnapshot>,
}

impl Scheduler {
    pub fn new(runner: Arc<dyn JobRunner>, settings: RunSettings) -> Self {
        Self::with_capacity(runner, settings, DEFAULT_CAPACITY)
    }

    /// Capacity below one is raised to one.
    pub fn with_capacity(runner: Arc<dyn JobRunner>, settings: RunSettings, capacity: usize) -> Self {
        let board = Board::new();
        let (snapshots, _) = watch::channel(board.snapshot(Instant::now()));
        Self {
            inner: Arc::new(Inner {
                runner,
                settings,
                capacity: capacity.max(1),
                board: Mutex::new(board),
                snapshots,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn settings(&self) -> &RunSettings {
        &self.inner.settings
    }

    /// Adds jobs for well-formed, non-duplicate URLs.
    pub fn submit<I, S>(&self, urls: I) -> SubmitReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut board = self.inner.board.lock();
        let report = board.submit(urls);
        if !report.added.is_empty() {
            self.publish(&board);
        }
        tracing::debug!(
            added = report.added.len(),
            duplicates = report.duplicates.len(),
            rejected = report.rejected.len(),
            "submit"
        );
        report
    }

    /// Runs every eligible job and resolves once the batch is terminal.
    ///
    /// Fails fast, leaving everything untouched, when a batch is already
    /// running or nothing is eligible. Dropping the returned future mid-run
    /// aborts the runners and ends the batch as `Cancelled`.
    pub async fn start(&self) -> Result<BatchSummary, SchedulerError> {
        let cancel = {
            let mut board = self.inner.board.lock();
            let cancel = board.begin(Instant::now())?;
            self.publish(&board);
            let stats = board.stats(Instant::now());
            tracing::info!(
                total = stats.total_count,
                capacity = self.inner.capacity,
                "batch started"
            );
            cancel
        };

        let guard = AbandonGuard { scheduler: self };
        self.drive(cancel).await;
        std::mem::forget(guard);

        let summary = self.inner.board.lock().summary(Instant::now());
        tracing::info!(
            state = %summary.state,
            completed = summary.completed,
            failed = summary.failed,
            stopped = summary.stopped,
            "batch finished in {:.1}s",
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }

    /// Cancels the running batch. Idempotent; a no-op unless running.
    ///
    /// Returns true if this call requested the cancellation.
    pub fn stop(&self) -> bool {
        let mut board = self.inner.board.lock();
        if !board.request_stop() {
            return false;
        }
        self.publish(&board);
        tracing::info!("batch stop requested");
        true
    }

    pub fn can_start(&self) -> bool {
        self.inner.board.lock().can_start()
    }

    pub fn can_stop(&self) -> bool {
        self.inner.board.lock().can_stop()
    }

    pub fn state(&self) -> BatchState {
        self.inner.board.lock().state()
    }

    /// Point-in-time copy with stats sampled now.
    pub fn snapshot(&self) -> BatchSnapshot {
        self.inner.board.lock().snapshot(Instant::now())
    }

    /// Receives a fresh snapshot after every job or batch mutation.
    pub fn subscribe(&self) -> watch::Receiver<BatchSnapshot> {
        self.inner.snapshots.subscribe()
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.inner.board.lock().jobs().to_vec()
    }

    pub fn job(&self, id: JobId) -> Option<Job> {
        self.inner
            .board
            .lock()
            .jobs()
            .iter()
            .find(|j| j.id() == id)
            .cloned()
    }

    pub fn stats(&self) -> AggregateStats {
        self.inner.board.lock().stats(Instant::now())
    }

    /// Failures of the current (or last) batch.
    pub fn error_log(&self) -> Vec<ErrorLogEntry> {
        self.inner.board.lock().error_log().to_vec()
    }

    /// Removes a job; refused while a batch is running.
    pub fn remove(&self, id: JobId) -> bool {
        let mut board = self.inner.board.lock();
        let removed = board.remove(id);
        if removed {
            self.publish(&board);
        }
        removed
    }

    /// Removes all completed jobs; refused while a batch is running.
    pub fn clear_finished(&self) -> usize {
        let mut board = self.inner.board.lock();
        let n = board.clear_finished();
        if n > 0 {
            self.publish(&board);
        }
        n
    }

    fn publish(&self, board: &Board) {
        self.inner.snapshots.send_replace(board.snapshot(Instant::now()));
    }
}

/// Settles the batch if `start()` is dropped before `drive` returns.
struct AbandonGuard<'a> {
    scheduler: &'a Scheduler,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        // Unwinding from a panic in a locked section must not deadlock.
        let Some(mut board) = self.scheduler.inner.board.try_lock() else {
            tracing::error!("batch driver dropped while the job table was locked");
            return;
        };
        board.abandon(Instant::now());
        self.scheduler.publish(&board);
        tracing::warn!("batch driver dropped mid-run; batch cancelled");
    }
}
