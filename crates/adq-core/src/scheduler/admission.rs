//! Admission loop: keeps up to `capacity` runners in flight until the queue
//! drains or the batch is cancelled, then settles the batch.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::job::{JobId, JobState};
use crate::runner::{JobEvent, JobReporter, JobTicket, RunnerError};

use super::Scheduler;

type RunResult = (JobId, Result<(), RunnerError>);

impl Scheduler {
    pub(super) async fn drive(&self, cancel: CancellationToken) {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<JobEvent>();
        let mut in_flight: JoinSet<RunResult> = JoinSet::new();

        loop {
            if !cancel.is_cancelled() {
                while in_flight.len() < self.inner.capacity {
                    let Some(ticket) = self.claim_next() else {
                        break;
                    };
                    let reporter = JobReporter::new(ticket.id, event_tx.clone());
                    in_flight.spawn(self.run_one(ticket, reporter, cancel.clone()));
                }
            }

            if in_flight.is_empty() {
                // Checked and closed under one lock so a late submit cannot
                // slip in between.
                let mut board = self.inner.board.lock();
                if board.settle(cancel.is_cancelled(), Instant::now()) {
                    self.publish(&board);
                    return;
                }
                continue;
            }

            tokio::select! {
                Some(event) = event_rx.recv() => self.apply_event(event),
                joined = in_flight.join_next() => match joined {
                    Some(Ok((job_id, result))) => {
                        // Updates sent before the runner returned belong before its outcome.
                        while let Ok(event) = event_rx.try_recv() {
                            self.apply_event(event);
                        }
                        self.finish_job(job_id, result);
                    }
                    Some(Err(e)) => tracing::error!("runner task join: {}", e),
                    None => {}
                },
            }
        }
    }

    fn run_one(
        &self,
        ticket: JobTicket,
        reporter: JobReporter,
        cancel: CancellationToken,
    ) -> impl std::future::Future<Output = RunResult> + Send + 'static {
        let runner = Arc::clone(&self.inner.runner);
        let settings = self.inner.settings.clone();
        async move {
            let run = runner.run(&ticket, &settings, &reporter, &cancel);
            let result = AssertUnwindSafe(run)
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(RunnerError::Panicked(panic_message(&*payload))));
            (ticket.id, result)
        }
    }

    fn claim_next(&self) -> Option<JobTicket> {
        let mut board = self.inner.board.lock();
        let ticket = board.claim_next_queued()?;
        self.publish(&board);
        tracing::info!(job_id = %ticket.id, url = %ticket.url, "job admitted");
        Some(ticket)
    }

    fn apply_event(&self, event: JobEvent) {
        let mut board = self.inner.board.lock();
        board.apply(event);
        self.publish(&board);
    }

    fn finish_job(&self, job_id: JobId, result: Result<(), RunnerError>) {
        let mut board = self.inner.board.lock();
        match board.finish(job_id, result) {
            Some((JobState::Failed, url)) => {
                let message = board
                    .error_log()
                    .last()
                    .map(|e| e.message.clone())
                    .unwrap_or_default();
                tracing::warn!(%job_id, %url, "job failed: {}", message);
            }
            Some((state, url)) => tracing::info!(%job_id, %url, "job {}", state),
            None => tracing::debug!(%job_id, "result for job that was not downloading"),
        }
        self.publish(&board);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
