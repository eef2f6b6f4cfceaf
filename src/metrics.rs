//! Prometheus instrumentation.
//!
//! Counters are registered once at first use against the default registry
//! and exposed in text format at `/metrics`.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::time::Instant;

lazy_static! {
    static ref REQUESTS: IntCounterVec = register_int_counter_vec!(
        "relive_requests_total",
        "Requests served, by endpoint and status code",
        &["endpoint", "status"]
    )
    .expect("metrics registration should succeed at startup");

    static ref REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "relive_request_duration_seconds",
        "Request handling latency, by endpoint",
        &["endpoint"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("metrics registration should succeed at startup");

    static ref UPSTREAM_ERRORS: IntCounter = register_int_counter!(
        "relive_upstream_errors_total",
        "Upstream fetches that ended in an error"
    )
    .expect("metrics registration should succeed at startup");

    static ref CACHE_LOOKUPS: IntCounterVec = register_int_counter_vec!(
        "relive_manifest_cache_lookups_total",
        "Manifest cache lookups, by outcome",
        &["outcome"]
    )
    .expect("metrics registration should succeed at startup");
}

pub fn record_request(endpoint: &str, status: u16) {
    REQUESTS
        .with_label_values(&[endpoint, &status.to_string()])
        .inc();
}

pub fn record_duration(endpoint: &str, start: Instant) {
    REQUEST_DURATION
        .with_label_values(&[endpoint])
        .observe(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error() {
    UPSTREAM_ERRORS.inc();
}

pub fn record_cache_lookup(outcome: &str) {
    CACHE_LOOKUPS.with_label_values(&[outcome]).inc();
}

/// Render the default registry in Prometheus text format.
pub fn render() -> String {
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if TextEncoder::new()
        .encode(&metric_families, &mut buffer)
        .is_err()
    {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
