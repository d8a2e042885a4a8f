//! Metrics collection and exposition.
//!
//! # Metrics
//! - `config_plane_reconcile_total` (counter): passes by `outcome`
//! - `config_plane_reconcile_duration_seconds` (histogram): pass latency
//! - `config_plane_decode_errors_total` (counter): files skipped
//! - `config_plane_snapshot_generation` (gauge): last committed version, by `group`
//! - `config_plane_active_sessions` (gauge): live subscriber sessions
//! - `config_plane_pushes_total` (counter): pushes by `kind`
//! - `config_plane_acks_total` (counter): responses by `kind` and `result`
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), metrics_exporter_prometheus::BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe();
    tracing::info!(address = %addr, "Prometheus metrics exporter listening");
    Ok(())
}

fn describe() {
    ::metrics::describe_counter!("config_plane_reconcile_total", "Reconciliation passes by outcome");
    ::metrics::describe_histogram!(
        "config_plane_reconcile_duration_seconds",
        ::metrics::Unit::Seconds,
        "Duration of a reconciliation pass"
    );
    ::metrics::describe_counter!("config_plane_decode_errors_total", "Resource files that failed to decode");
    ::metrics::describe_gauge!("config_plane_snapshot_generation", "Generation of the live snapshot");
    ::metrics::describe_gauge!("config_plane_active_sessions", "Connected subscriber sessions");
    ::metrics::describe_counter!("config_plane_pushes_total", "Resource pushes sent");
    ::metrics::describe_counter!("config_plane_acks_total", "Subscriber responses by result");
}

pub fn record_reconcile(outcome: &'static str, duration: Duration) {
    ::metrics::counter!("config_plane_reconcile_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("config_plane_reconcile_duration_seconds").record(duration.as_secs_f64());
}

pub fn record_decode_error() {
    ::metrics::counter!("config_plane_decode_errors_total").increment(1);
}

pub fn record_snapshot_committed(group: &str, generation: u64) {
    ::metrics::gauge!("config_plane_snapshot_generation", "group" => group.to_string()).set(generation as f64);
}

pub fn record_active_sessions(active: u64) {
    ::metrics::gauge!("config_plane_active_sessions").set(active as f64);
}

pub fn record_push(kind: &'static str) {
    ::metrics::counter!("config_plane_pushes_total", "kind" => kind).increment(1);
}

pub fn record_ack(kind: &'static str, result: &'static str) {
    ::metrics::counter!("config_plane_acks_total", "kind" => kind, "result" => result).increment(1);
}
