//! Metrics collection and exposition.
//!
//! # Metrics
//! - `supervisor_pool_running` (gauge): 1 while the worker pool runs
//! - `supervisor_worker_exits_total` (counter): worker exits by name and outcome
//! - `supervisor_probe_healthy` (gauge): last result per probe, 1=healthy
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; exposition is optional
//! - Labels are limited to worker and probe names

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const POOL_RUNNING: &str = "supervisor_pool_running";
pub const WORKER_EXITS: &str = "supervisor_worker_exits_total";
pub const PROBE_HEALTHY: &str = "supervisor_probe_healthy";

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_pool_running(running: bool) {
    ::metrics::gauge!(POOL_RUNNING).set(if running { 1.0 } else { 0.0 });
}

/// `outcome` is one of `success`, `error` or `panic`.
pub fn record_worker_exit(worker: &str, outcome: &'static str) {
    ::metrics::counter!(WORKER_EXITS, "worker" => worker.to_string(), "outcome" => outcome)
        .increment(1);
}

pub fn record_probe_health(probe: &str, healthy: bool) {
    ::metrics::gauge!(PROBE_HEALTHY, "probe" => probe.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
