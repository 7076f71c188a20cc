//! Per-credential health state.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The most recent failure recorded against a credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastError {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub latency_ms: u64,
}

/// Health counters for one credential.
///
/// `consecutive_error_count` resets on any success. `is_healthy` flips to false
/// when the count reaches the pool's error threshold and back to true on the
/// next success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialStatus {
    pub is_healthy: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub consecutive_error_count: u32,
    pub last_error: Option<LastError>,
    pub last_latency_ms: Option<u64>,
    pub total_requests: u64,
    pub success_requests: u64,
}

impl Default for CredentialStatus {
    fn default() -> Self {
        Self {
            is_healthy: true,
            last_used_at: None,
            consecutive_error_count: 0,
            last_error: None,
            last_latency_ms: None,
            total_requests: 0,
            success_requests: 0,
        }
    }
}

impl CredentialStatus {
    pub(crate) fn record_checkout(&mut self, now: DateTime<Utc>) {
        self.last_used_at = Some(now);
        self.total_requests += 1;
    }

    pub(crate) fn record_success(&mut self, latency_ms: u64) {
        self.success_requests += 1;
        self.consecutive_error_count = 0;
        self.is_healthy = true;
        self.last_latency_ms = Some(latency_ms);
    }

    /// Record a failure. Returns true once the count has reached the threshold.
    pub(crate) fn record_error(
        &mut self,
        message: String,
        latency_ms: u64,
        now: DateTime<Utc>,
        threshold: u32,
    ) -> bool {
        self.consecutive_error_count = self.consecutive_error_count.saturating_add(1);
        self.last_latency_ms = Some(latency_ms);
        self.last_error = Some(LastError {
            message,
            timestamp: now,
            latency_ms,
        });

        let reached = self.consecutive_error_count >= threshold;
        if reached {
            self.is_healthy = false;
        }
        reached
    }

    pub(crate) fn record_probe_success(&mut self, latency_ms: u64) {
        self.consecutive_error_count = 0;
        self.is_healthy = true;
        self.last_latency_ms = Some(latency_ms);
    }

    pub(crate) fn record_probe_failure(&mut self, message: String, latency_ms: u64, now: DateTime<Utc>) {
        self.consecutive_error_count = self.consecutive_error_count.saturating_add(1);
        self.is_healthy = false;
        self.last_latency_ms = Some(latency_ms);
        self.last_error = Some(LastError {
            message,
            timestamp: now,
            latency_ms,
        });
    }

    /// Success ratio over all checkouts, or `None` before the first request.
    pub fn success_rate(&self) -> Option<f64> {
        if self.total_requests == 0 {
            None
        } else {
            Some(self.success_requests as f64 / self.total_requests as f64)
        }
    }
}
