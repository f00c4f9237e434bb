//! Scheduler precondition errors, returned synchronously from `start()`.

use thiserror::Error;

use super::BatchState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("batch is {0}, cannot start")]
    InvalidState(BatchState),

    #[error("no job is pending, queued, failed or stopped")]
    NoWork,
}
