//! Operator health-check probing.

use super::Secret;
use async_trait::async_trait;
use serde::Serialize;

/// Checks whether a single credential is currently accepted upstream.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// `Ok(())` if the credential works, `Err(message)` otherwise.
    async fn probe(&self, secret: &Secret) -> Result<(), String>;
}

/// Result of probing one credential.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeOutcome {
    pub id: String,
    pub healthy: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate result of [`CredentialPool::perform_health_check`](super::CredentialPool::perform_health_check).
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckSummary {
    pub healthy: usize,
    pub unhealthy: usize,
    pub results: Vec<ProbeOutcome>,
}
