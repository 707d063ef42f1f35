//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hashwire_connections_active` (gauge): registered connections
//! - `hashwire_frames_total` (counter): frames decoded
//! - `hashwire_frames_rejected_total` (counter): unparseable frames, by reason
//! - `hashwire_requests_unmatched_total` (counter): requests with no route
//! - `hashwire_responses_total` (counter): responses written
//! - `hashwire_evictions_total` (counter): closed connections, by reason
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn set_active_connections(count: usize) {
    metrics::gauge!("hashwire_connections_active").set(count as f64);
}

pub fn record_frame() {
    metrics::counter!("hashwire_frames_total").increment(1);
}

pub fn record_rejected(reason: &'static str) {
    metrics::counter!("hashwire_frames_rejected_total", "reason" => reason).increment(1);
}

pub fn record_unmatched() {
    metrics::counter!("hashwire_requests_unmatched_total").increment(1);
}

pub fn record_response() {
    metrics::counter!("hashwire_responses_total").increment(1);
}

pub fn record_eviction(reason: &'static str) {
    metrics::counter!("hashwire_evictions_total", "reason" => reason).increment(1);
}
