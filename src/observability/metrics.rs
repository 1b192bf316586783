//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dev_allowlist_decisions_total` (counter): gate outcomes by `decision`
//! - `dev_allowlist_entries` (gauge): size of the assembled allowlist
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Exporter is optional and off by default

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one gatekeeper outcome.
pub fn record_decision(decision: &'static str) {
    ::metrics::counter!("dev_allowlist_decisions_total", "decision" => decision).increment(1);
}

/// Publish the number of allowlist entries.
pub fn record_allowlist_size(len: usize) {
    ::metrics::gauge!("dev_allowlist_entries").set(len as f64);
}
