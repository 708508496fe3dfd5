//! Prometheus metrics for the vmm bot.
//!
//! Covers the trading schedule (intervals, iterations), order placement and
//! quote-range resolution.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a startup-time programming error.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_int_counter, CounterVec, Encoder,
    Histogram, IntCounter, TextEncoder,
};

use crate::error::TelemetryResult;

/// Total scheduling intervals started.
pub static INTERVALS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("vmm_intervals_total", "Total scheduling intervals started").unwrap()
});

/// Iterations by outcome.
/// Labels: outcome (ok/failed/panicked)
pub static ITERATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vmm_iterations_total",
        "Total trading iterations executed by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Iteration wall-clock duration in seconds.
pub static ITERATION_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "vmm_iteration_duration_seconds",
        "Trading iteration duration in seconds",
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap()
});

/// Orders by side and result.
/// Labels: side (buy/sell), result (placed/failed)
pub static ORDERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vmm_orders_total",
        "Total orders submitted by side and result",
        &["side", "result"]
    )
    .unwrap()
});

/// Resolved quote ranges by resolution tier.
pub static QUOTE_RANGE_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vmm_quote_range_total",
        "Resolved quote ranges by resolution tier",
        &["tier"]
    )
    .unwrap()
});

/// Iterations that resolved no tradable quote.
pub static QUOTES_SKIPPED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vmm_quotes_skipped_total",
        "Iterations skipped because no legal quote existed",
        &["reason"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record the start of a scheduling interval.
    pub fn interval_started() {
        INTERVALS_TOTAL.inc();
    }

    /// Record a finished iteration.
    pub fn iteration_finished(outcome: &str, duration_secs: f64) {
        ITERATIONS_TOTAL.with_label_values(&[outcome]).inc();
        ITERATION_DURATION_SECONDS.observe(duration_secs);
    }

    /// Record an order submission result.
    pub fn order_submitted(side: &str, placed: bool) {
        let result = if placed { "placed" } else { "failed" };
        ORDERS_TOTAL.with_label_values(&[side, result]).inc();
    }

    /// Record which resolution tier produced the quote range.
    pub fn quote_range_resolved(tier: &str) {
        QUOTE_RANGE_TOTAL.with_label_values(&[tier]).inc();
    }

    /// Record a skipped quote.
    pub fn quote_skipped(reason: &str) {
        QUOTES_SKIPPED_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Render the default registry in Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
