//! Metrics collection and exposition.
//!
//! # Metrics
//! - `velarium_requests_total` (counter): requests by method, status
//! - `velarium_request_duration_seconds` (histogram): latency distribution
//! - `velarium_startup_phase` (gauge): ordinal of the current startup phase
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    metrics::counter!(
        "velarium_requests_total",
        "method" => method.clone(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "velarium_request_duration_seconds",
        "method" => method,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

/// Publish the startup phase ordinal.
pub fn record_phase(ordinal: u8) {
    metrics::gauge!("velarium_startup_phase").set(ordinal as f64);
}
