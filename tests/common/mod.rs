//! Shared workers, probes and server helpers for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use worker_supervisor::config::HealthConfig;
use worker_supervisor::health::{Checker, Probe, ProbeOutcome};
use worker_supervisor::lifecycle::{Shutdown, ShutdownReason};
use worker_supervisor::worker::{BoxError, Worker};
use worker_supervisor::HealthServer;

/// Runs until cancelled; records that it observed cancellation.
pub struct Blocking {
    name: String,
    pub started: Arc<AtomicUsize>,
    pub cancelled: Arc<AtomicUsize>,
}

impl Blocking {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            started: Arc::new(AtomicUsize::new(0)),
            cancelled: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst) > 0
    }
}

#[async_trait]
impl Worker for Blocking {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, cancel: CancellationToken) -> Result<(), BoxError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        cancel.cancelled().await;
        self.cancelled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fails with `message` after `delay`.
pub struct Failing {
    name: String,
    delay: Duration,
    message: String,
}

impl Failing {
    pub fn new(name: &str, delay: Duration, message: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            delay,
            message: message.to_string(),
        })
    }
}

#[async_trait]
impl Worker for Failing {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _cancel: CancellationToken) -> Result<(), BoxError> {
        tokio::time::sleep(self.delay).await;
        Err(self.message.clone().into())
    }
}

/// Ignores cancellation for `unwind` before returning.
pub struct Stubborn {
    pub unwind: Duration,
}

#[async_trait]
impl Worker for Stubborn {
    fn name(&self) -> &str {
        "stubborn"
    }

    async fn run(&self, cancel: CancellationToken) -> Result<(), BoxError> {
        cancel.cancelled().await;
        tokio::time::sleep(self.unwind).await;
        Ok(())
    }
}

/// Probe whose outcome can be flipped at runtime.
pub struct Switch {
    name: String,
    healthy: AtomicBool,
}

impl Switch {
    pub fn new(name: &str, healthy: bool) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            healthy: AtomicBool::new(healthy),
        })
    }

    pub fn set(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl Probe for Switch {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> ProbeOutcome {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(format!("{} is up", self.name))
        } else {
            Err(format!("{} is down", self.name).into())
        }
    }
}

/// Serve `checker` on an ephemeral port with the default health config.
pub async fn start_health_server(checker: Arc<Checker>) -> (SocketAddr, Shutdown, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HealthServer::new(HealthConfig::default(), checker);
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    (addr, shutdown, handle)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn stop(shutdown: &Shutdown) {
    shutdown.trigger(ShutdownReason::Requested);
}
