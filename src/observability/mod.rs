//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! worker pool, health checker, HTTP layer produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (gauges and counters via the metrics facade)
//!
//! Consumers:
//!     → stdout (text or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Recording is always safe; without an installed recorder it is a no-op
//! - Request IDs are attached by the HTTP layer, not here

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
