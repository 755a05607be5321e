//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, defaults for missing sections)
//!     → SUPERVISOR_* environment overrides
//!     → validation.rs (semantic checks)
//!     → SupervisorConfig (validated, immutable)
//!     → consumed once by the composition root
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::SupervisorConfig;
pub use schema::{HealthConfig, LifecycleConfig, ObservabilityConfig};
pub use schema::{ProbeConfig, WorkerConfig, WorkersConfig};
