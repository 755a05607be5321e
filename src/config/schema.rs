//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the supervisor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the worker supervisor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Health endpoint settings.
    pub health: HealthConfig,

    /// Process lifecycle settings.
    pub lifecycle: LifecycleConfig,

    /// Ticker workers to run in the pool.
    pub workers: WorkersConfig,

    /// TCP dependency probes, in addition to the built-in `workers` probe.
    pub probes: Vec<ProbeConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Health endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Path serving the health check.
    pub path: String,

    /// Upper bound on a single probe, in milliseconds.
    pub probe_timeout_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            path: "/health".to_string(),
            probe_timeout_ms: 5_000,
        }
    }
}

/// Lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// How long the pool may take to unwind on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: 10,
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct WorkersConfig(pub Vec<WorkerConfig>);

impl Default for WorkersConfig {
    fn default() -> Self {
        Self(vec![WorkerConfig {
            name: "greet".to_string(),
            interval_secs: default_interval_secs(),
            message: default_message(),
        }])
    }
}

impl std::ops::Deref for WorkersConfig {
    type Target = Vec<WorkerConfig>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A periodic ticker worker.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// Worker name, unique within the pool.
    pub name: String,

    /// Seconds between ticks.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Message logged on every tick.
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_interval_secs() -> u64 {
    10
}

fn default_message() -> String {
    "hello from the worker pool".to_string()
}

/// A TCP connectivity probe.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Probe name as reported in the health result.
    pub name: String,

    /// Dependency address (e.g., "127.0.0.1:5432").
    pub address: String,

    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_connect_timeout_ms() -> u64 {
    1_000
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SupervisorConfig::default();
        assert_eq!(config.health.bind_address, "0.0.0.0:8080");
        assert_eq!(config.health.path, "/health");
        assert_eq!(config.lifecycle.shutdown_grace_secs, 10);
        assert_eq!(config.workers.len(), 1);
        assert_eq!(config.workers[0].name, "greet");
        assert!(config.probes.is_empty());
    }

    #[test]
    fn test_partial_toml() {
        let config: SupervisorConfig = toml::from_str(
            r#"
            [health]
            path = "/healthz"

            [[workers]]
            name = "alpha"

            [[workers]]
            name = "beta"
            interval_secs = 2
            message = "beta tick"

            [[probes]]
            name = "db"
            address = "127.0.0.1:5432"
            "#,
        )
        .unwrap();

        assert_eq!(config.health.path, "/healthz");
        assert_eq!(config.health.bind_address, "0.0.0.0:8080");
        assert_eq!(config.workers.len(), 2);
        assert_eq!(config.workers[0].interval_secs, 10);
        assert_eq!(config.workers[1].message, "beta tick");
        assert_eq!(config.probes[0].connect_timeout_ms, 1_000);
    }
}
