//! Worker supervision subsystem.
//!
//! # Data Flow
//! ```text
//! Composition root builds Vec<Arc<dyn Worker>>
//!     → pool.rs (WorkerPool owns the fixed set)
//!     → start(): one tokio task per worker, shared cancellation scope
//!     → supervisor task reaps exits
//!         - first error/panic → cancel scope → siblings unwind
//!         - all exited       → running = false
//!     → stop(grace): cancel scope → join supervisor (bounded)
//! ```
//!
//! # Design Decisions
//! - Workers are a fixed set, never submitted at runtime
//! - Fail fast, fail together: no per-worker restart
//! - The pool's scope is independent of the caller's token
//! - `running` is observable lock-free from any number of readers

pub mod pool;
pub mod ticker;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use pool::{PoolError, WorkerPool};
pub use ticker::TickerWorker;

/// Boxed error returned by worker implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A named, long-running unit of work managed by a [`WorkerPool`].
///
/// `run` should return once `cancel` fires. Returning `Ok(())` early is a
/// clean exit; returning `Err` tears down every sibling in the pool.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Name used in logs, metrics and error reports.
    fn name(&self) -> &str;

    /// Run until cancelled or until the work completes on its own.
    async fn run(&self, cancel: CancellationToken) -> Result<(), BoxError>;
}
