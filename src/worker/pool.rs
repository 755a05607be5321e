//! Worker pool with fail-fast, fail-together semantics.
//!
//! # Responsibilities
//! - Launch every worker concurrently under one cancellation scope
//! - Cancel all siblings when the first worker fails
//! - Track the running flag across start, stop and implicit stop
//! - Bound the shutdown wait with a caller-supplied grace period

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::observability::metrics;
use crate::worker::{BoxError, Worker};

/// Errors surfaced by [`WorkerPool::start`] and [`WorkerPool::stop`].
#[derive(Debug, Error)]
pub enum PoolError {
    /// A run is already active (or a failed run has not been reaped by `stop`).
    #[error("worker pool is already running")]
    AlreadyRunning,

    /// The caller's token was cancelled before any worker was launched.
    #[error("worker pool start cancelled")]
    Cancelled,

    /// A worker returned an error, which tore down the whole pool.
    #[error("worker {worker} stopped with error: {source}")]
    Worker {
        worker: String,
        #[source]
        source: BoxError,
    },

    /// A worker panicked, which tore down the whole pool.
    #[error("worker {worker} panicked")]
    Panicked { worker: String },

    /// Workers were still unwinding when the grace period elapsed.
    #[error("workers did not stop within {0:?}")]
    StopTimeout(Duration),

    /// The supervisor task itself failed to complete.
    #[error("worker pool supervisor failed: {0}")]
    Supervisor(#[from] JoinError),
}

/// Running and failure flags shared with the supervisor task.
struct PoolState {
    running: watch::Sender<bool>,
    /// Set on the first worker failure of the current run.
    failed: watch::Sender<bool>,
    /// Bumped on every start so a stale supervisor cannot touch a newer run.
    generation: AtomicU64,
}

impl PoolState {
    fn new() -> Self {
        let (running, _) = watch::channel(false);
        let (failed, _) = watch::channel(false);
        Self {
            running,
            failed,
            generation: AtomicU64::new(0),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn mark_running(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.failed.send_replace(false);
        self.running.send_replace(true);
        metrics::record_pool_running(true);
        generation
    }

    fn mark_failed(&self, generation: u64) {
        self.failed.send_if_modified(|failed| {
            if !*failed && self.is_current(generation) {
                *failed = true;
                true
            } else {
                false
            }
        });
    }

    fn mark_stopped(&self, generation: u64) {
        let cleared = self.running.send_if_modified(|running| {
            if *running && self.is_current(generation) {
                *running = false;
                true
            } else {
                false
            }
        });
        if cleared {
            metrics::record_pool_running(false);
        }
    }
}

/// First worker error of a run, readable before the run has fully unwound.
#[derive(Default)]
struct FirstError(StdMutex<Option<PoolError>>);

impl FirstError {
    /// Keep `error` unless one is already recorded. Returns whether it was kept.
    fn record(&self, error: PoolError) -> bool {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }
        *slot = Some(error);
        true
    }

    fn take(&self) -> Option<PoolError> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// The run started by the last successful `start`.
struct ActiveRun {
    scope: CancellationToken,
    supervisor: JoinHandle<()>,
    first_error: Arc<FirstError>,
    generation: u64,
}

/// How a single worker's `run` ended.
enum WorkerExit {
    Clean,
    Failed(BoxError),
    Panicked,
}

/// Supervisor for a fixed set of long-running workers.
///
/// At most one run is active at a time. `start` and `stop` are serialized by
/// an internal lock; `running` never takes it.
pub struct WorkerPool {
    workers: Vec<Arc<dyn Worker>>,
    state: Arc<PoolState>,
    active: Mutex<Option<ActiveRun>>,
}

impl WorkerPool {
    /// Create a pool over `workers`. Insertion order is launch order.
    pub fn new(workers: Vec<Arc<dyn Worker>>) -> Self {
        Self {
            workers,
            state: Arc::new(PoolState::new()),
            active: Mutex::new(None),
        }
    }

    /// Names of the managed workers, in launch order.
    pub fn worker_names(&self) -> Vec<&str> {
        self.workers.iter().map(|w| w.name()).collect()
    }

    /// Launch every worker and mark the pool running.
    ///
    /// `outer` is only consulted before launch; cancelling it later does not
    /// touch the workers. Use [`WorkerPool::stop`] for an orderly shutdown.
    pub async fn start(&self, outer: &CancellationToken) -> Result<(), PoolError> {
        let mut active = self.active.lock().await;

        if active.is_some() {
            tracing::warn!("Worker pool is already running");
            return Err(PoolError::AlreadyRunning);
        }

        if outer.is_cancelled() {
            tracing::warn!("Worker pool start cancelled before launch");
            return Err(PoolError::Cancelled);
        }

        tracing::debug!(workers = self.workers.len(), "Starting worker pool");

        let scope = CancellationToken::new();
        let mut tasks = JoinSet::new();
        for worker in &self.workers {
            tasks.spawn(run_worker(Arc::clone(worker), scope.clone()));
        }

        let generation = self.state.mark_running();
        let first_error = Arc::new(FirstError::default());
        let supervisor = tokio::spawn(supervise(
            tasks,
            scope.clone(),
            Arc::clone(&self.state),
            Arc::clone(&first_error),
            generation,
        ));

        *active = Some(ActiveRun {
            scope,
            supervisor,
            first_error,
            generation,
        });

        tracing::info!(workers = ?self.worker_names(), "Worker pool started");
        Ok(())
    }

    /// Cancel every worker and wait up to `grace` for them to unwind.
    ///
    /// A no-op when the pool was never started or is already stopped. The
    /// running flag is cleared even when the grace period elapses; slow
    /// workers then finish unwinding in the background. A worker error
    /// takes precedence over the deadline error.
    pub async fn stop(&self, grace: Duration) -> Result<(), PoolError> {
        let mut active = self.active.lock().await;

        let Some(run) = active.take() else {
            tracing::warn!("Worker pool is not started");
            return Ok(());
        };

        tracing::debug!(grace = ?grace, "Stopping worker pool");
        run.scope.cancel();

        let outcome = tokio::time::timeout(grace, run.supervisor).await;
        self.state.mark_stopped(run.generation);
        let first_error = run.first_error.take();

        match outcome {
            Ok(Ok(())) => {
                tracing::info!("Worker pool stopped");
                first_error.map_or(Ok(()), Err)
            }
            Ok(Err(joined)) => Err(first_error.unwrap_or(PoolError::Supervisor(joined))),
            Err(_) => {
                tracing::error!(grace = ?grace, "Worker pool stop timed out");
                Err(first_error.unwrap_or(PoolError::StopTimeout(grace)))
            }
        }
    }

    /// Whether a run is active and has not stopped, explicitly or by failure.
    pub fn running(&self) -> bool {
        *self.state.running.borrow()
    }

    /// Resolve once the pool is not running.
    ///
    /// Returns immediately on a stopped pool; after `start` it resolves on
    /// `stop` or when every worker has exited (including by failure).
    pub async fn wait_stopped(&self) {
        let mut running = self.state.running.subscribe();
        // The sender lives in `self.state`, so this only returns on a value.
        let _ = running.wait_for(|running| !*running).await;
    }

    /// Resolve when a worker of the current run fails.
    ///
    /// Fires as soon as the shared scope is cancelled, before siblings have
    /// unwound, so the caller can bound the rest with [`WorkerPool::stop`].
    /// Pending forever on a run that never fails.
    pub async fn wait_failed(&self) {
        let mut failed = self.state.failed.subscribe();
        let _ = failed.wait_for(|failed| *failed).await;
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Some(run) = self.active.get_mut().as_ref() {
            run.scope.cancel();
        }
    }
}

async fn run_worker(worker: Arc<dyn Worker>, cancel: CancellationToken) -> (String, WorkerExit) {
    let name = worker.name().to_string();
    tracing::debug!(worker = %name, "Starting worker");

    let exit = match AssertUnwindSafe(worker.run(cancel)).catch_unwind().await {
        Ok(Ok(())) => {
            tracing::debug!(worker = %name, "Worker stopped with success");
            metrics::record_worker_exit(&name, "success");
            WorkerExit::Clean
        }
        Ok(Err(error)) => {
            tracing::error!(worker = %name, error = %error, "Worker stopped with error");
            metrics::record_worker_exit(&name, "error");
            WorkerExit::Failed(error)
        }
        Err(panic) => {
            tracing::error!(worker = %name, panic = panic_message(&*panic), "Worker panicked");
            metrics::record_worker_exit(&name, "panic");
            WorkerExit::Panicked
        }
    };

    (name, exit)
}

/// Reap worker exits; the first failure cancels the shared scope.
async fn supervise(
    mut tasks: JoinSet<(String, WorkerExit)>,
    scope: CancellationToken,
    state: Arc<PoolState>,
    first_error: Arc<FirstError>,
    generation: u64,
) {
    while let Some(joined) = tasks.join_next().await {
        let error = match joined {
            Ok((_, WorkerExit::Clean)) => continue,
            Ok((worker, WorkerExit::Failed(source))) => PoolError::Worker { worker, source },
            Ok((worker, WorkerExit::Panicked)) => PoolError::Panicked { worker },
            Err(e) => {
                tracing::warn!(error = %e, "Worker task aborted");
                continue;
            }
        };

        let message = error.to_string();
        if first_error.record(error) {
            tracing::warn!(error = %message, "Cancelling sibling workers");
            scope.cancel();
            state.mark_failed(generation);
        }
    }

    state.mark_stopped(generation);
    tracing::debug!("All workers exited");
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// Runs until cancelled and counts how many times it saw cancellation.
    struct UntilCancelled {
        name: String,
        cancelled: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Worker for UntilCancelled {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, cancel: CancellationToken) -> Result<(), BoxError> {
            cancel.cancelled().await;
            self.cancelled.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailsAfter {
        delay: Duration,
    }

    #[async_trait]
    impl Worker for FailsAfter {
        fn name(&self) -> &str {
            "failing"
        }

        async fn run(&self, _cancel: CancellationToken) -> Result<(), BoxError> {
            tokio::time::sleep(self.delay).await;
            Err("boom".into())
        }
    }

    struct Panics;

    #[async_trait]
    impl Worker for Panics {
        fn name(&self) -> &str {
            "panicky"
        }

        async fn run(&self, _cancel: CancellationToken) -> Result<(), BoxError> {
            panic!("worker blew up");
        }
    }

    fn until_cancelled(name: &str, counter: &Arc<AtomicUsize>) -> Arc<dyn Worker> {
        Arc::new(UntilCancelled {
            name: name.to_string(),
            cancelled: counter.clone(),
        })
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(vec![
            until_cancelled("a", &counter),
            until_cancelled("b", &counter),
        ]);
        assert!(!pool.running());

        pool.start(&CancellationToken::new()).await.unwrap();
        assert!(pool.running());

        pool.stop(Duration::from_secs(1)).await.unwrap();
        assert!(!pool.running());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_double_start_rejected() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(vec![until_cancelled("a", &counter)]);

        pool.start(&CancellationToken::new()).await.unwrap();
        let err = pool.start(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, PoolError::AlreadyRunning));

        pool.stop(Duration::from_secs(1)).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_outer_token_never_launches() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(vec![until_cancelled("a", &counter)]);
        let outer = CancellationToken::new();
        outer.cancel();

        let err = pool.start(&outer).await.unwrap_err();
        assert!(matches!(err, PoolError::Cancelled));
        assert!(!pool.running());

        // Nothing to reap.
        pool.stop(Duration::from_secs(1)).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_outer_cancel_after_start_leaves_workers_running() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(vec![until_cancelled("a", &counter)]);
        let outer = CancellationToken::new();

        pool.start(&outer).await.unwrap();
        outer.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(pool.running());
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        pool.stop(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_failure_cancels_siblings() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(vec![
            until_cancelled("a", &counter),
            Arc::new(FailsAfter {
                delay: Duration::from_millis(10),
            }),
            until_cancelled("b", &counter),
        ]);

        pool.start(&CancellationToken::new()).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), pool.wait_stopped())
            .await
            .expect("pool should stop after a worker failure");

        assert!(!pool.running());
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        let err = pool.stop(Duration::from_secs(1)).await.unwrap_err();
        match err {
            PoolError::Worker { worker, source } => {
                assert_eq!(worker, "failing");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected error: {other}"),
        }

        // Reaped: a second stop is a no-op.
        pool.stop(Duration::from_secs(1)).await.unwrap();
    }

    /// Takes `unwind` to return after cancellation.
    struct SlowUnwind {
        unwind: Duration,
    }

    #[async_trait]
    impl Worker for SlowUnwind {
        fn name(&self) -> &str {
            "slow"
        }

        async fn run(&self, cancel: CancellationToken) -> Result<(), BoxError> {
            cancel.cancelled().await;
            tokio::time::sleep(self.unwind).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_wait_failed_fires_before_siblings_unwind() {
        let pool = WorkerPool::new(vec![
            Arc::new(SlowUnwind {
                unwind: Duration::from_secs(5),
            }),
            Arc::new(FailsAfter {
                delay: Duration::from_millis(10),
            }),
        ]);

        pool.start(&CancellationToken::new()).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), pool.wait_failed())
            .await
            .expect("failure should be visible before siblings unwind");
        assert!(pool.running());

        // The worker error wins over the deadline error.
        let err = pool.stop(Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, PoolError::Worker { ref worker, .. } if worker == "failing"));
        assert!(!pool.running());
    }

    #[tokio::test]
    async fn test_wait_failed_resets_on_restart() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(vec![
            until_cancelled("a", &counter),
            Arc::new(FailsAfter {
                delay: Duration::from_millis(10),
            }),
        ]);

        pool.start(&CancellationToken::new()).await.unwrap();
        pool.wait_failed().await;
        assert!(pool.stop(Duration::from_secs(1)).await.is_err());

        pool.start(&CancellationToken::new()).await.unwrap();
        assert!(tokio::time::timeout(Duration::from_millis(5), pool.wait_failed())
            .await
            .is_err());
        pool.wait_failed().await;
        assert!(pool.stop(Duration::from_secs(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_panic_is_a_worker_failure() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(vec![until_cancelled("a", &counter), Arc::new(Panics)]);

        pool.start(&CancellationToken::new()).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), pool.wait_stopped())
            .await
            .unwrap();

        let err = pool.stop(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, PoolError::Panicked { ref worker } if worker == "panicky"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(vec![until_cancelled("a", &counter)]);

        for _ in 0..2 {
            pool.start(&CancellationToken::new()).await.unwrap();
            assert!(pool.running());
            pool.stop(Duration::from_secs(1)).await.unwrap();
            assert!(!pool.running());
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_error_display() {
        let err = PoolError::StopTimeout(Duration::from_secs(2));
        assert_eq!(err.to_string(), "workers did not stop within 2s");

        let err = PoolError::Worker {
            worker: "greet".into(),
            source: "boom".into(),
        };
        assert_eq!(err.to_string(), "worker greet stopped with error: boom");
    }
}
