//! Schedulable unit of work.

use std::fmt;

use futures_util::future::BoxFuture;

/// Position of an iteration in the schedule, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationContext {
    /// 1-based interval number.
    pub interval: u64,
    /// 1-based iteration number within the interval.
    pub iteration: u32,
}

/// Work the scheduler runs once per fired timer.
///
/// Errors are logged and counted; they never stop the schedule.
pub trait IterationTask: Send + Sync + 'static {
    type Error: fmt::Display + Send;

    fn execute(&self, ctx: IterationContext) -> BoxFuture<'_, Result<(), Self::Error>>;
}
