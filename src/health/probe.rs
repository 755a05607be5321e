//! Probe capability contract.

use async_trait::async_trait;
use thiserror::Error;

/// A probe failure. Recorded in the check result, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ProbeError(pub String);

impl From<String> for ProbeError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for ProbeError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(error: std::io::Error) -> Self {
        Self(error.to_string())
    }
}

/// Outcome of a single probe: a status message on success.
pub type ProbeOutcome = Result<String, ProbeError>;

/// A named, independent health check.
///
/// Implementations may read shared state but must not own it. A probe that
/// never returns is cut off by the checker's per-probe timeout.
#[async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> &str;

    async fn probe(&self) -> ProbeOutcome;
}
