//! Prometheus metrics for backend calls.
//!
//! This module provides metrics for:
//! - Health probe latency and failures
//! - Listing fetch latency, failures and item counts
//! - Store refresh cycles

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

use crate::endpoint::Backend;

// === Metric Name Constants ===

/// Health probe latency metric name.
pub const METRIC_PROBE_LATENCY: &str = "probe_latency_ms";
/// Listing fetch latency metric name.
pub const METRIC_FETCH_LATENCY: &str = "fetch_latency_ms";
/// Failed health probes counter metric name.
pub const METRIC_PROBE_FAILURES: &str = "probe_failures_total";
/// Failed listing fetches counter metric name.
pub const METRIC_FETCH_FAILURES: &str = "fetch_failures_total";
/// Items received counter metric name.
pub const METRIC_ITEMS_FETCHED: &str = "items_fetched_total";
/// Store refresh cycles counter metric name.
pub const METRIC_REFRESH_CYCLES: &str = "refresh_cycles_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_PROBE_LATENCY,
        "Health probe latency in milliseconds"
    );
    describe_histogram!(
        METRIC_FETCH_LATENCY,
        "Listing fetch latency in milliseconds"
    );

    describe_counter!(
        METRIC_PROBE_FAILURES,
        "Total number of health probes that ended in an error marker"
    );
    describe_counter!(
        METRIC_FETCH_FAILURES,
        "Total number of listing fetches degraded to an empty list"
    );
    describe_counter!(
        METRIC_ITEMS_FETCHED,
        "Total number of items received from backends"
    );
    describe_counter!(
        METRIC_REFRESH_CYCLES,
        "Total number of store load cycles started"
    );

    debug!("Metrics initialized");
}

/// Install the global Prometheus recorder and return its render handle.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Record health probe latency.
pub fn record_probe_latency(start: Instant, backend: Backend) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_PROBE_LATENCY, "backend" => backend.to_string()).record(latency_ms);
}

/// Record listing fetch latency.
pub fn record_fetch_latency(start: Instant, backend: Backend) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_FETCH_LATENCY, "backend" => backend.to_string()).record(latency_ms);
}

/// Increment failed probes counter.
pub fn inc_probe_failures(backend: Backend) {
    counter!(METRIC_PROBE_FAILURES, "backend" => backend.to_string()).increment(1);
}

/// Increment failed fetches counter.
pub fn inc_fetch_failures(backend: Backend) {
    counter!(METRIC_FETCH_FAILURES, "backend" => backend.to_string()).increment(1);
}

/// Add to items received counter.
pub fn add_items_fetched(backend: Backend, count: usize) {
    counter!(METRIC_ITEMS_FETCHED, "backend" => backend.to_string()).increment(count as u64);
}

/// Increment refresh cycles counter for `kind` ("health" or "items").
pub fn inc_refresh_cycles(kind: &'static str) {
    counter!(METRIC_REFRESH_CYCLES, "kind" => kind).increment(1);
}
