//! Scheduler error types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Scheduler already started")]
    AlreadyStarted,

    #[error("Scheduler already stopped")]
    AlreadyStopped,

    #[error("Invalid scheduler config: {0}")]
    InvalidConfig(String),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
