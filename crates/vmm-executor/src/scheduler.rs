//! Jittered interval scheduler.
//!
//! Every interval fans out `iterations_per_interval` timer tasks with
//! random offsets. Fired timers signal a bounded channel, and the run loop
//! drains it one signal at a time, running the task to completion before
//! taking the next signal. Iterations therefore never overlap, whatever
//! order or timing the timers fire in.
//!
//! ```text
//! timer(offset_1) ─┐
//! timer(offset_2) ─┼─> mpsc(n) ─> run loop ─> task.execute() (serial)
//! timer(offset_n) ─┘
//! ```
//!
//! Shutdown cancels a shared token. Every wait (timers, signal receive,
//! interval remainder) observes it; a running iteration does not, so
//! `shutdown` returns only after that iteration has finished. The run loop
//! task fires a second token when it exits, and every `shutdown` caller
//! waits on that one.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vmm_telemetry::Metrics;

use crate::config::SchedulerConfig;
use crate::error::{SchedulerError, SchedulerResult};
use crate::task::{IterationContext, IterationTask};

/// Scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Upper bound for random timer offsets.
///
/// With an average iteration duration, leaves room for all iterations to
/// run before the interval ends: `interval - iterations * avg`, floored at
/// zero. Without one, the whole interval.
pub fn jitter_ceiling(interval: Duration, iterations: u32, avg: Option<Duration>) -> Duration {
    match avg {
        Some(avg) => interval.saturating_sub(avg.saturating_mul(iterations)),
        None => interval,
    }
}

/// Moving average of iteration duration: `(9 * prev + sample) / 10`.
/// The first sample seeds the average.
pub fn update_ema(prev: Option<Duration>, sample: Duration) -> Duration {
    match prev {
        Some(prev) => (prev.saturating_mul(9) + sample) / 10,
        None => sample,
    }
}

/// Runs an [`IterationTask`] on a jittered, non-overlapping schedule.
pub struct IntervalScheduler<T: IterationTask> {
    config: SchedulerConfig,
    task: Arc<T>,
    state: Mutex<SchedulerState>,
    shutdown_token: CancellationToken,
    /// Fired when the run loop task ends, however it ends.
    stopped: CancellationToken,
}

impl<T: IterationTask> IntervalScheduler<T> {
    pub fn new(config: SchedulerConfig, task: Arc<T>) -> SchedulerResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            task,
            state: Mutex::new(SchedulerState::Idle),
            shutdown_token: CancellationToken::new(),
            stopped: CancellationToken::new(),
        })
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Spawn the run loop and return immediately.
    ///
    /// The first interval starts without delay. Must be called from within
    /// a tokio runtime.
    pub fn start(&self) -> SchedulerResult<()> {
        let mut state = self.state.lock();
        match *state {
            SchedulerState::Running => return Err(SchedulerError::AlreadyStarted),
            SchedulerState::Stopped => return Err(SchedulerError::AlreadyStopped),
            SchedulerState::Idle => {}
        }

        let run_loop = RunLoop::new(
            self.config.clone(),
            Arc::clone(&self.task),
            self.shutdown_token.clone(),
        );
        let stopped = self.stopped.clone();
        tokio::spawn(async move {
            let _stopped = stopped.drop_guard();
            run_loop.run().await;
        });
        *state = SchedulerState::Running;
        Ok(())
    }

    /// Stop scheduling and wait for the run loop to exit.
    ///
    /// An in-flight iteration runs to completion first. Safe to call in any
    /// state, any number of times and from several callers at once; each
    /// call returns only once the run loop has exited, including after an
    /// earlier call was dropped mid-wait.
    pub async fn shutdown(&self) {
        self.shutdown_token.cancel();
        {
            let mut state = self.state.lock();
            if *state == SchedulerState::Idle {
                *state = SchedulerState::Stopped;
                return;
            }
        }
        self.stopped.cancelled().await;
        *self.state.lock() = SchedulerState::Stopped;
    }
}

/// State owned by the spawned run loop. Single writer.
struct RunLoop<T: IterationTask> {
    config: SchedulerConfig,
    task: Arc<T>,
    shutdown_token: CancellationToken,
    rng: StdRng,
    run_count: u64,
    last_run: Option<DateTime<Utc>>,
    avg_iteration: Option<Duration>,
}

impl<T: IterationTask> RunLoop<T> {
    fn new(config: SchedulerConfig, task: Arc<T>, shutdown_token: CancellationToken) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            task,
            shutdown_token,
            rng,
            run_count: 0,
            last_run: None,
            avg_iteration: None,
        }
    }

    async fn run(mut self) {
        info!(
            interval_ms = self.config.interval_ms,
            iterations = self.config.iterations_per_interval,
            "Scheduler started"
        );
        while !self.shutdown_token.is_cancelled() {
            self.run_interval().await;
        }
        info!(
            intervals = self.run_count,
            last_run = ?self.last_run,
            "Scheduler stopped"
        );
    }

    async fn run_interval(&mut self) {
        let started = Instant::now();
        self.run_count += 1;
        let interval_no = self.run_count;
        let interval = self.config.interval();
        let iterations = self.config.iterations_per_interval;
        Metrics::interval_started();
        debug!(interval = interval_no, "Interval started");

        if iterations > 0 {
            let ceiling = if self.config.adaptive_jitter {
                jitter_ceiling(interval, iterations, self.avg_iteration)
            } else {
                interval
            };

            let (tx, mut rx) = mpsc::channel::<()>(iterations as usize);
            let mut timers = JoinSet::new();
            for _ in 0..iterations {
                let offset = self.draw_offset(ceiling);
                let tx = tx.clone();
                let token = self.shutdown_token.clone();
                timers.spawn(async move {
                    tokio::select! {
                        () = tokio::time::sleep(offset) => {
                            let _ = tx.send(()).await;
                        }
                        () = token.cancelled() => {}
                    }
                });
            }
            drop(tx);

            let mut iteration = 0;
            while iteration < iterations {
                let signal = tokio::select! {
                    biased;
                    () = self.shutdown_token.cancelled() => None,
                    signal = rx.recv() => signal,
                };
                if signal.is_none() {
                    break;
                }
                iteration += 1;
                self.execute(IterationContext {
                    interval: interval_no,
                    iteration,
                })
                .await;
            }
            timers.abort_all();
        }

        if let Some(remaining) = interval.checked_sub(started.elapsed()) {
            tokio::select! {
                () = tokio::time::sleep(remaining) => {}
                () = self.shutdown_token.cancelled() => {}
            }
        }

        self.last_run = Some(Utc::now());
        debug!(
            interval = interval_no,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Interval finished"
        );
    }

    async fn execute(&mut self, ctx: IterationContext) {
        let task = Arc::clone(&self.task);
        let started = Instant::now();
        debug!(interval = ctx.interval, iteration = ctx.iteration, "Iteration started");

        let result = AssertUnwindSafe(task.execute(ctx)).catch_unwind().await;

        let elapsed = started.elapsed();
        let outcome = match result {
            Ok(Ok(())) => {
                debug!(
                    interval = ctx.interval,
                    iteration = ctx.iteration,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Iteration finished"
                );
                "ok"
            }
            Ok(Err(e)) => {
                warn!(
                    interval = ctx.interval,
                    iteration = ctx.iteration,
                    error = %e,
                    "Iteration failed"
                );
                "failed"
            }
            Err(panic) => {
                error!(
                    interval = ctx.interval,
                    iteration = ctx.iteration,
                    panic = %panic_message(panic.as_ref()),
                    "Iteration panicked"
                );
                "panicked"
            }
        };

        self.avg_iteration = Some(update_ema(self.avg_iteration, elapsed));
        Metrics::iteration_finished(outcome, elapsed.as_secs_f64());
    }

    fn draw_offset(&mut self, ceiling: Duration) -> Duration {
        let nanos = u64::try_from(ceiling.as_nanos()).unwrap_or(u64::MAX);
        if nanos == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.rng.gen_range(0..nanos))
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
