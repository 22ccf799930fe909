//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, mount, route
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency
//! - `gateway_upstream_failures_total` (counter): transport failures by mount, kind
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so handlers never
//!   check whether metrics are enabled
//! - Route label is the logical route name, or "passthrough"

use std::net::SocketAddr;
use std::time::Instant;

use metrics::Label;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "gateway_requests_total";
pub const REQUEST_DURATION: &str = "gateway_request_duration_seconds";
pub const UPSTREAM_FAILURES: &str = "gateway_upstream_failures_total";

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, mount: &str, route: &str, start: Instant) {
    let labels = vec![
        Label::new("method", method.to_string()),
        Label::new("status", status.to_string()),
        Label::new("mount", mount.to_string()),
        Label::new("route", route.to_string()),
    ];
    metrics::counter!(REQUESTS_TOTAL, labels.clone()).increment(1);
    metrics::histogram!(REQUEST_DURATION, labels).record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_failure(mount: &str, kind: &'static str) {
    metrics::counter!(UPSTREAM_FAILURES, "mount" => mount.to_string(), "kind" => kind).increment(1);
}
