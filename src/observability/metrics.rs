//! Metrics recording.
//!
//! # Metrics
//! - `transport_requests_total` (counter): logical requests by outcome
//! - `transport_request_duration_seconds` (histogram): end-to-end latency
//! - `transport_attempts_total` (counter): attempts by host and outcome
//! - `transport_dead_marks_total` (counter): failures reported per host
//! - `transport_sniffs_total` (counter): sniffs by outcome
//! - `transport_pool_size` (gauge): connections in the current set

use std::net::SocketAddr;
use std::time::Instant;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::connection::Host;

/// Install the Prometheus exporter on `addr`. Needs a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| e.to_string())?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(outcome: &'static str, start: Instant) {
    metrics::counter!("transport_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("transport_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_attempt(host: &Host, outcome: &'static str) {
    metrics::counter!(
        "transport_attempts_total",
        "host" => host.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_dead_mark(host: &Host) {
    metrics::counter!("transport_dead_marks_total", "host" => host.to_string()).increment(1);
}

pub fn record_sniff(outcome: &'static str) {
    metrics::counter!("transport_sniffs_total", "outcome" => outcome).increment(1);
}

pub fn record_pool_size(size: usize) {
    metrics::gauge!("transport_pool_size").set(size as f64);
}
