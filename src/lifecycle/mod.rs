//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → build workers/probes → App → Pool.start → serve health
//!
//! Shutdown (shutdown.rs):
//!     Trigger (signal | worker failed | pool stopped | request) → stop server → Pool.stop(grace)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accepting, then stop the pool
//! - Shutdown has a deadline: `lifecycle.shutdown_grace_secs`

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownReason};
pub use startup::{App, AppError};
