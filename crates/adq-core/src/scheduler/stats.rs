//! Aggregate view of a batch, recomputed from job states on every change.

use std::time::{Duration, Instant};

use crate::job::Job;

/// Summary numbers for the current (or last) batch.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateStats {
    /// Jobs that reached a terminal state since the batch started.
    pub processed_count: usize,
    /// Jobs in the batch.
    pub total_count: usize,
    /// Plain average over batch jobs, terminal jobs counting as 100.
    pub overall_progress: f64,
    /// From `start()` to the batch's terminal state, or to now while running.
    pub elapsed: Duration,
}

impl AggregateStats {
    pub fn empty() -> Self {
        Self {
            processed_count: 0,
            total_count: 0,
            overall_progress: 0.0,
            elapsed: Duration::ZERO,
        }
    }

    /// Fraction of jobs processed in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        (self.processed_count as f64 / self.total_count as f64).min(1.0)
    }

    pub fn remaining(&self) -> usize {
        self.total_count.saturating_sub(self.processed_count)
    }
}

/// Elapsed time: frozen at `finished` once set, else measured to `now`.
pub(super) fn elapsed(started: Option<Instant>, finished: Option<Instant>, now: Instant) -> Duration {
    match started {
        Some(start) => finished.unwrap_or(now).saturating_duration_since(start),
        None => Duration::ZERO,
    }
}

pub(super) fn compute<'a>(
    batch_jobs: impl Iterator<Item = &'a Job>,
    processed_count: usize,
    total_count: usize,
    elapsed: Duration,
) -> AggregateStats {
    let (sum, n) = batch_jobs.fold((0.0, 0usize), |(sum, n), job| {
        (sum + job.effective_progress(), n + 1)
    });
    let overall_progress = if n == 0 { 0.0 } else { sum / n as f64 };
    AggregateStats {
        processed_count,
        total_count,
        overall_progress,
        elapsed,
    }
}
