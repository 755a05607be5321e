//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the pool and checker from explicit worker and probe lists
//! - Register the `workers` probe against the pool
//! - Drive the start hook, wait for a shutdown trigger, drive the stop hook
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener is bound by the caller so tests can use port 0
//! - Shutdown triggers: OS signal, worker failure, pool stopped on its own,
//!   in-process request

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinError;

use crate::config::{ConfigError, SupervisorConfig};
use crate::health::{Checker, Probe, TcpProbe, WorkersProbe};
use crate::http::HealthServer;
use crate::lifecycle::shutdown::{Shutdown, ShutdownReason};
use crate::lifecycle::signals::wait_for_signal;
use crate::worker::{PoolError, TickerWorker, Worker, WorkerPool};

/// Top-level error returned from `main`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("worker pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("health server task failed: {0}")]
    Server(#[from] JoinError),
}

/// Composition root: one pool, one checker, one health server.
pub struct App {
    config: SupervisorConfig,
    pool: Arc<WorkerPool>,
    checker: Arc<Checker>,
    shutdown: Shutdown,
}

impl App {
    /// Wire already-built workers and probes.
    ///
    /// The `workers` probe is prepended to `probes`.
    pub fn new(
        config: SupervisorConfig,
        workers: Vec<Arc<dyn Worker>>,
        probes: Vec<Arc<dyn Probe>>,
    ) -> Self {
        let pool = Arc::new(WorkerPool::new(workers));

        let mut all_probes: Vec<Arc<dyn Probe>> = Vec::with_capacity(probes.len() + 1);
        all_probes.push(Arc::new(WorkersProbe::new(Arc::clone(&pool))));
        all_probes.extend(probes);

        let checker = Arc::new(
            Checker::new(all_probes)
                .with_probe_timeout(Duration::from_millis(config.health.probe_timeout_ms)),
        );

        Self {
            config,
            pool,
            checker,
            shutdown: Shutdown::new(),
        }
    }

    /// Build ticker workers and TCP probes from configuration.
    pub fn from_config(config: SupervisorConfig) -> Self {
        let workers = config
            .workers
            .iter()
            .map(|w| Arc::new(TickerWorker::from_config(w)) as Arc<dyn Worker>)
            .collect();
        let probes = config
            .probes
            .iter()
            .map(|p| Arc::new(TcpProbe::from_config(p)) as Arc<dyn Probe>)
            .collect();

        Self::new(config, workers, probes)
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    pub fn checker(&self) -> &Arc<Checker> {
        &self.checker
    }

    /// Handle for requesting shutdown from elsewhere in the process.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    fn grace(&self) -> Duration {
        Duration::from_secs(self.config.lifecycle.shutdown_grace_secs)
    }

    /// Start hook. Refused once shutdown has been triggered.
    pub async fn start(&self) -> Result<(), AppError> {
        self.pool.start(self.shutdown.token()).await?;
        Ok(())
    }

    /// Stop hook, bounded by `lifecycle.shutdown_grace_secs`.
    pub async fn stop(&self) -> Result<(), AppError> {
        self.pool.stop(self.grace()).await?;
        Ok(())
    }

    /// Start the pool, serve health on `listener`, and block until shutdown.
    ///
    /// The pool is always stopped before returning, bounded by the grace
    /// period. A worker failure surfaces as [`AppError::Pool`].
    pub async fn run(self, listener: TcpListener) -> Result<ShutdownReason, AppError> {
        let mut requested = self.shutdown.subscribe();

        self.start().await?;

        let server = HealthServer::new(self.config.health.clone(), Arc::clone(&self.checker));
        let server_task = tokio::spawn(server.run(listener, self.shutdown.subscribe()));

        let reason = tokio::select! {
            _ = wait_for_signal() => ShutdownReason::Signal,
            _ = self.pool.wait_failed() => ShutdownReason::WorkerFailed,
            _ = self.pool.wait_stopped() => ShutdownReason::PoolStopped,
            received = requested.recv() => received.unwrap_or(ShutdownReason::Requested),
        };

        match reason {
            ShutdownReason::WorkerFailed => tracing::error!("Worker failed, shutting down"),
            ShutdownReason::PoolStopped => tracing::warn!("Worker pool stopped on its own"),
            _ => {}
        }
        self.shutdown.trigger(reason);

        let stopped = self.stop().await;
        let served = server_task.await;

        stopped?;
        served??;

        tracing::info!(reason = %reason, "Shutdown complete");
        Ok(reason)
    }
}
