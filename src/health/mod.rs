//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Reporting boundary (http/server.rs)
//!     → checker.rs: Checker::check()
//!         → one task per probe, each bounded by the probe timeout
//!             - workers.rs: reads WorkerPool::running()
//!             - tcp.rs:     connects to a dependency
//!             - any other Probe impl
//!         → fold into CheckerResult { status, probes }
//! ```
//!
//! # Design Decisions
//! - A probe failure is a value, not an error: it never aborts the check
//! - Every probe gets an entry, even if it timed out or panicked
//! - Results are recomputed per call; nothing is cached

pub mod checker;
pub mod probe;
pub mod tcp;
pub mod workers;

pub use checker::{Checker, CheckerResult, HealthStatus, ProbeResult, DEFAULT_PROBE_TIMEOUT};
pub use probe::{Probe, ProbeError, ProbeOutcome};
pub use tcp::TcpProbe;
pub use workers::WorkersProbe;
