//! Concurrent health aggregation.
//!
//! # Responsibilities
//! - Run every probe as its own task on each check
//! - Bound each probe with a timeout
//! - Fold outcomes into one overall status plus a per-probe breakdown

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::health::probe::{Probe, ProbeError};
use crate::observability::metrics;

/// Per-probe timeout used when none is configured.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Binary health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(self) -> bool {
        self == HealthStatus::Healthy
    }
}

/// One probe's entry in a [`CheckerResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub status: HealthStatus,
    pub message: String,
}

/// Immutable output of a single [`Checker::check`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerResult {
    pub status: HealthStatus,
    pub probes: BTreeMap<String, ProbeResult>,
}

impl CheckerResult {
    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    /// Status of the named probe, if it was part of this check.
    pub fn probe_status(&self, name: &str) -> Option<HealthStatus> {
        self.probes.get(name).map(|p| p.status)
    }

    /// Number of probes reported unhealthy.
    pub fn unhealthy_count(&self) -> usize {
        self.probes
            .values()
            .filter(|p| !p.status.is_healthy())
            .count()
    }
}

/// Runs a fixed set of probes concurrently and aggregates their results.
pub struct Checker {
    probes: Vec<Arc<dyn Probe>>,
    probe_timeout: Duration,
}

impl Checker {
    pub fn new(probes: Vec<Arc<dyn Probe>>) -> Self {
        Self {
            probes,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Override the per-probe timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    pub fn probe_names(&self) -> Vec<&str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// Run every probe and aggregate.
    ///
    /// Overall status is unhealthy iff at least one probe failed, timed out or
    /// panicked. Every probe always gets an entry. Dropping the returned
    /// future aborts the probes still in flight.
    pub async fn check(&self) -> CheckerResult {
        let mut tasks = JoinSet::new();
        for probe in &self.probes {
            tasks.spawn(run_probe(Arc::clone(probe), self.probe_timeout));
        }

        // Results are folded here, one at a time, as tasks complete.
        let mut healthy = true;
        let mut probes = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, result)) => {
                    healthy &= result.status.is_healthy();
                    probes.insert(name, result);
                }
                Err(e) => {
                    // run_probe catches panics; only an external abort lands here.
                    tracing::warn!(error = %e, "Probe task aborted");
                    healthy = false;
                }
            }
        }

        let status = if healthy {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        tracing::debug!(status = ?status, probes = probes.len(), "Health check complete");

        CheckerResult { status, probes }
    }
}

async fn run_probe(probe: Arc<dyn Probe>, timeout: Duration) -> (String, ProbeResult) {
    let name = probe.name().to_string();

    let outcome = match tokio::time::timeout(timeout, AssertUnwindSafe(probe.probe()).catch_unwind()).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(_)) => Err(ProbeError::from("probe panicked")),
        Err(_) => Err(ProbeError(format!("probe timed out after {:?}", timeout))),
    };

    let result = match outcome {
        Ok(message) => {
            tracing::debug!(probe = %name, message = %message, "Probe succeeded");
            ProbeResult {
                status: HealthStatus::Healthy,
                message,
            }
        }
        Err(e) => {
            tracing::warn!(probe = %name, error = %e, "Probe failed");
            ProbeResult {
                status: HealthStatus::Unhealthy,
                message: e.to_string(),
            }
        }
    };

    metrics::record_probe_health(&name, result.status.is_healthy());
    (name, result)
}
