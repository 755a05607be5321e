//! HTTP reporting subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → health handler (one Checker::check per request)
//!     → status code, plus CheckerResult JSON when verbose
//!
//! supervisor-cli
//!     → client.rs (GET health path) → HealthReport → exit code
//! ```

pub mod client;
pub mod server;

pub use client::{fetch_health, HealthReport};
pub use server::HealthServer;
