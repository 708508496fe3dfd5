//! Application error types.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Market maker error: {0}")]
    Maker(#[from] vmm_mm::MmError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] vmm_executor::SchedulerError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] vmm_telemetry::TelemetryError),

    #[error("Shutdown did not complete within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
