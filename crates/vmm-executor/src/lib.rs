//! Interval scheduler for the vmm bot.
//!
//! Runs an [`IterationTask`] a fixed number of times per interval at
//! random offsets, one iteration at a time, until shut down.

pub mod config;
pub mod error;
pub mod scheduler;
pub mod task;

pub use config::{SchedulerConfig, MAX_ITERATIONS_PER_INTERVAL};
pub use error::{SchedulerError, SchedulerResult};
pub use scheduler::{jitter_ceiling, update_ema, IntervalScheduler, SchedulerState};
pub use task::{IterationContext, IterationTask};
