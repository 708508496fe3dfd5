//! Scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SchedulerError, SchedulerResult};

/// Upper bound on timers spawned per interval.
pub const MAX_ITERATIONS_PER_INTERVAL: u32 = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval length in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Iterations per interval. Zero turns every interval into a plain sleep.
    #[serde(default = "default_iterations_per_interval")]
    pub iterations_per_interval: u32,

    /// Shrink the random offset ceiling by the average iteration duration
    /// so late timers still fire inside their interval.
    #[serde(default = "default_true")]
    pub adaptive_jitter: bool,

    /// Seed for timer offsets. Unset = seeded from entropy.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            iterations_per_interval: default_iterations_per_interval(),
            adaptive_jitter: true,
            rng_seed: None,
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> SchedulerResult<()> {
        if self.interval_ms == 0 {
            return Err(SchedulerError::InvalidConfig(
                "interval_ms must be positive".to_string(),
            ));
        }
        if self.iterations_per_interval > MAX_ITERATIONS_PER_INTERVAL {
            return Err(SchedulerError::InvalidConfig(format!(
                "iterations_per_interval must be at most {MAX_ITERATIONS_PER_INTERVAL}, got {}",
                self.iterations_per_interval
            )));
        }
        Ok(())
    }
}

fn default_interval_ms() -> u64 {
    60_000
}
fn default_iterations_per_interval() -> u32 {
    2
}
fn default_true() -> bool {
    true
}
