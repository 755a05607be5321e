//! Probe that reports the worker pool's running state.

use std::sync::Arc;

use async_trait::async_trait;

use crate::health::probe::{Probe, ProbeOutcome};
use crate::worker::WorkerPool;

/// Healthy iff the wrapped pool is running at the moment of the call.
pub struct WorkersProbe {
    pool: Arc<WorkerPool>,
}

impl WorkersProbe {
    pub const NAME: &'static str = "workers";

    pub fn new(pool: Arc<WorkerPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Probe for WorkersProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn probe(&self) -> ProbeOutcome {
        if self.pool.running() {
            Ok("workers are running".to_string())
        } else {
            tracing::error!("Worker pool is not running");
            Err("workers are not running".into())
        }
    }
}
