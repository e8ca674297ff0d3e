//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, upstream errors)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, route
//! - `gateway_request_duration_seconds` (histogram): latency per route
//! - `gateway_upstream_errors_total` (counter): backend failures by route, kind
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Unmatched requests are labelled `route="none"`

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);

    histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a failed backend call.
pub fn record_upstream_error(route: &str, kind: &'static str) {
    counter!(
        "gateway_upstream_errors_total",
        "route" => route.to_string(),
        "kind" => kind
    )
    .increment(1);
}
