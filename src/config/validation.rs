//! Configuration validation.
//!
//! Serde handles syntax; this checks values. All errors are collected so a
//! bad config file is reported in one pass.

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::SupervisorConfig;
use crate::health::WorkersProbe;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &SupervisorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.health.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("health.bind_address", "must be a socket address"));
    }
    if !config.health.path.starts_with('/') {
        errors.push(ValidationError::new("health.path", "must start with '/'"));
    }
    if config.health.probe_timeout_ms == 0 {
        errors.push(ValidationError::new("health.probe_timeout_ms", "must be greater than 0"));
    }
    if config.lifecycle.shutdown_grace_secs == 0 {
        errors.push(ValidationError::new("lifecycle.shutdown_grace_secs", "must be greater than 0"));
    }

    if config.workers.is_empty() {
        errors.push(ValidationError::new("workers", "at least one worker is required"));
    }
    let mut worker_names = HashSet::new();
    for (i, worker) in config.workers.iter().enumerate() {
        if worker.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("workers[{i}].name"), "must not be empty"));
        } else if !worker_names.insert(worker.name.as_str()) {
            errors.push(ValidationError::new(
                format!("workers[{i}].name"),
                format!("duplicate worker name '{}'", worker.name),
            ));
        }
        if worker.interval_secs == 0 {
            errors.push(ValidationError::new(format!("workers[{i}].interval_secs"), "must be greater than 0"));
        }
    }

    // The built-in pool probe shares the namespace.
    let mut probe_names = HashSet::from([WorkersProbe::NAME]);
    for (i, probe) in config.probes.iter().enumerate() {
        if probe.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("probes[{i}].name"), "must not be empty"));
        } else if !probe_names.insert(probe.name.as_str()) {
            errors.push(ValidationError::new(
                format!("probes[{i}].name"),
                format!("duplicate probe name '{}'", probe.name),
            ));
        }
        if probe.address.trim().is_empty() {
            errors.push(ValidationError::new(format!("probes[{i}].address"), "must not be empty"));
        }
        if probe.connect_timeout_ms == 0 {
            errors.push(ValidationError::new(format!("probes[{i}].connect_timeout_ms"), "must be greater than 0"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new("observability.metrics_address", "must be a socket address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ProbeConfig, WorkerConfig, WorkersConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&SupervisorConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = SupervisorConfig::default();
        config.health.bind_address = "not-an-address".into();
        config.health.path = "health".into();
        config.lifecycle.shutdown_grace_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            ["health.bind_address", "health.path", "lifecycle.shutdown_grace_secs"]
        );
    }

    #[test]
    fn test_duplicate_names() {
        let worker = WorkerConfig {
            name: "greet".into(),
            interval_secs: 1,
            message: "hi".into(),
        };
        let mut config = SupervisorConfig::default();
        config.workers = WorkersConfig(vec![worker.clone(), worker]);
        config.probes.push(ProbeConfig {
            name: "workers".into(),
            address: "127.0.0.1:5432".into(),
            connect_timeout_ms: 100,
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].to_string(), "workers[1].name: duplicate worker name 'greet'");
        assert_eq!(errors[1].field, "probes[0].name");
    }

    #[test]
    fn test_empty_pool_rejected() {
        let mut config = SupervisorConfig::default();
        config.workers = WorkersConfig(vec![]);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "workers");
    }
}
