//! Prometheus metrics for the proof gateway
//!
//! Only outcome labels and block heights; never node ids or record
//! contents.

use metrics::{counter, gauge, histogram};
use std::time::Duration;

pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_CLIENT_ERROR: &str = "client_error";
pub const OUTCOME_SERVER_ERROR: &str = "server_error";

pub fn record_proof_request(outcome: &str, duration: Duration) {
    counter!("proof_requests_total", "outcome" => outcome.to_string()).increment(1);
    histogram!("proof_request_duration_seconds", "outcome" => outcome.to_string())
        .record(duration.as_secs_f64());
}

pub fn set_anchor_block(block: u64) {
    gauge!("anchor_block_number").set(block as f64);
}

pub fn init_prometheus_recorder() -> metrics_exporter_prometheus::PrometheusHandle {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    builder.install_recorder().expect("Failed to install Prometheus recorder")
}
