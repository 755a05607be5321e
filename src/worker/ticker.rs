//! Periodic worker that emits a greeting on every tick.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::WorkerConfig;
use crate::worker::{BoxError, Worker};

/// Logs `message` every `interval` until cancelled.
#[derive(Debug)]
pub struct TickerWorker {
    name: String,
    interval: Duration,
    message: String,
    ticks: AtomicU64,
}

impl TickerWorker {
    pub fn new(name: impl Into<String>, interval: Duration, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interval,
            message: message.into(),
            ticks: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(
            config.name.clone(),
            Duration::from_secs(config.interval_secs),
            config.message.clone(),
        )
    }

    /// Number of ticks performed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Worker for TickerWorker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, cancel: CancellationToken) -> Result<(), BoxError> {
        tracing::info!(worker = %self.name, interval = ?self.interval, "Ticker worker starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(worker = %self.name, ticks = self.ticks(), "Ticker worker received cancellation, exiting loop");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::info!(worker = %self.name, tick, "{}", self.message);
                }
            }
        }
    }
}
