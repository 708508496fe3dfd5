//! Prometheus metrics and structured logging for the vmm bot.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus counters/histograms for intervals, iterations and orders

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
