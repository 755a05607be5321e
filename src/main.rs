//! Worker Supervisor
//!
//! Runs a fixed pool of long-lived workers that fail together, and reports
//! process health over HTTP.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │               WORKER SUPERVISOR              │
//!                    │                                              │
//!   GET /health      │  ┌──────────┐    ┌─────────┐    ┌─────────┐  │
//!   ─────────────────┼─▶│   http   │───▶│ checker │───▶│ probes  │  │
//!                    │  │  server  │    └─────────┘    └────┬────┘  │
//!                    │  └──────────┘                        │       │
//!                    │                                       ▼       │
//!                    │  ┌───────────┐   start/stop   ┌───────────┐  │
//!   SIGINT/SIGTERM ──┼─▶│ lifecycle │───────────────▶│ worker    │  │
//!                    │  │    App    │                │ pool      │  │
//!                    │  └───────────┘                └───────────┘  │
//!                    │                                              │
//!                    │  config · observability (logs, metrics)      │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use worker_supervisor::config::load_or_default;
use worker_supervisor::lifecycle::{App, AppError};
use worker_supervisor::observability::{init_logging, init_metrics};

#[derive(Parser)]
#[command(name = "worker-supervisor")]
#[command(about = "Supervised worker pool with an HTTP health endpoint", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "SUPERVISOR_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("logging already initialized: {e}");
    }

    tracing::info!("worker-supervisor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.health.bind_address,
        workers = config.workers.len(),
        probes = config.probes.len(),
        shutdown_grace_secs = config.lifecycle.shutdown_grace_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.health.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for health checks");

    let app = App::from_config(config);
    let reason = app.run(listener).await?;

    tracing::info!(reason = %reason, "Exiting");
    Ok(())
}
