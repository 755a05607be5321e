//! Shutdown coordination for the supervisor.

use std::fmt;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Why the process is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT or SIGTERM.
    Signal,
    /// A worker failed; siblings are being cancelled.
    WorkerFailed,
    /// Every worker exited on its own without a failure.
    PoolStopped,
    /// [`Shutdown::trigger`] was called in-process.
    Requested,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShutdownReason::Signal => "signal",
            ShutdownReason::WorkerFailed => "worker failed",
            ShutdownReason::PoolStopped => "pool stopped",
            ShutdownReason::Requested => "requested",
        };
        f.write_str(s)
    }
}

/// Coordinator for graceful shutdown.
///
/// Long-running tasks subscribe to the broadcast channel. The token flips
/// once and stays flipped, so late starters can see a shutdown they missed.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<ShutdownReason>,
    token: CancellationToken,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(4);
        Self {
            tx,
            token: CancellationToken::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownReason> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Only the first trigger is broadcast.
    pub fn trigger(&self, reason: ShutdownReason) {
        if self.token.is_cancelled() {
            return;
        }
        tracing::info!(reason = %reason, "Shutdown triggered");
        self.token.cancel();
        let _ = self.tx.send(reason);
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token cancelled on the first trigger.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
