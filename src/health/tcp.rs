//! TCP connectivity probe for external dependencies.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time;

use crate::config::ProbeConfig;
use crate::health::probe::{Probe, ProbeError, ProbeOutcome};

/// Healthy when a TCP connection to `address` opens within `connect_timeout`.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    name: String,
    address: String,
    connect_timeout: Duration,
}

impl TcpProbe {
    pub fn new(name: impl Into<String>, address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            connect_timeout,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(
            config.name.clone(),
            config.address.clone(),
            Duration::from_millis(config.connect_timeout_ms),
        )
    }

    /// Open and drop a connection within the connect timeout.
    async fn connect(&self) -> Result<(), ProbeError> {
        let connect = TcpStream::connect(&self.address);
        match time::timeout(self.connect_timeout, connect).await {
            Ok(stream) => {
                stream?;
                Ok(())
            }
            Err(_) => Err(ProbeError(format!("timed out after {:?}", self.connect_timeout))),
        }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> ProbeOutcome {
        match self.connect().await {
            Ok(()) => Ok(format!("connected to {}", self.address)),
            Err(e) => {
                tracing::error!(probe = %self.name, address = %self.address, error = %e, "Dependency connect error");
                Err(ProbeError(format!("connect to {} failed: {}", self.address, e)))
            }
        }
    }
}
