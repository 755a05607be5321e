//! Worker Supervisor Library

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod worker;

pub use config::schema::SupervisorConfig;
pub use health::{Checker, CheckerResult, HealthStatus, Probe};
pub use http::HealthServer;
pub use lifecycle::{App, AppError, Shutdown, ShutdownReason};
pub use worker::{Worker, WorkerPool};
