//! The shared credential pool.

use super::{Clock, Credential, CredentialStatus, HealthCheckSummary, HealthProbe, ProbeOutcome};
use super::{Secret, SystemClock};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Rotation policy knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// Consecutive errors before a credential is marked unhealthy
    pub error_threshold: u32,
    /// Minimum time between two rotations
    pub rotation_cooldown: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            error_threshold: 3,
            rotation_cooldown: Duration::from_secs(5),
        }
    }
}

/// Snapshot of the active credential.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialInfo {
    pub id: String,
    pub priority: usize,
    pub index: usize,
    pub status: CredentialStatus,
}

/// One row of a [`PoolStatusReport`].
#[derive(Debug, Clone, Serialize)]
pub struct CredentialReport {
    pub id: String,
    pub priority: usize,
    pub index: usize,
    pub secret: Secret,
    pub is_current: bool,
    pub status: CredentialStatus,
}

/// Consistent snapshot of the whole pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatusReport {
    pub current_index: usize,
    pub rotation_count: u64,
    pub last_rotation_at: Option<DateTime<Utc>>,
    pub healthy_count: usize,
    pub credentials: Vec<CredentialReport>,
}

/// A credential handed out by [`CredentialPool::checkout`].
#[derive(Debug, Clone)]
pub struct Checkout {
    pub index: usize,
    pub id: String,
    pub secret: Secret,
}

struct PoolState {
    statuses: Vec<CredentialStatus>,
    current: usize,
    rotation_count: u64,
    last_rotation_at: Option<DateTime<Utc>>,
}

/// Ordered set of credentials with per-credential health and rotation.
///
/// One pool is shared by every concurrent invocation of a gateway. All state
/// lives behind a single mutex, and the lock is never held across an `.await`.
///
/// # Examples
///
/// ```
/// use lens::credential::{CredentialPool, PoolSettings, Secret};
///
/// let pool = CredentialPool::from_secrets(
///     vec![Secret::new("key-a"), Secret::new("key-b")],
///     PoolSettings::default(),
/// );
/// assert_eq!(pool.current().unwrap().expose(), "key-a");
/// assert!(pool.rotate("manual"));
/// assert_eq!(pool.current().unwrap().expose(), "key-b");
/// ```
pub struct CredentialPool {
    credentials: Vec<Credential>,
    settings: PoolSettings,
    clock: Arc<dyn Clock>,
    state: Mutex<PoolState>,
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPool")
            .field("credentials", &self.credentials)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl CredentialPool {
    /// Build a pool from credentials in ascending priority order.
    pub fn new(credentials: Vec<Credential>, settings: PoolSettings) -> Self {
        let statuses = vec![CredentialStatus::default(); credentials.len()];
        Self {
            credentials,
            settings,
            clock: Arc::new(SystemClock),
            state: Mutex::new(PoolState {
                statuses,
                current: 0,
                rotation_count: 0,
                last_rotation_at: None,
            }),
        }
    }

    /// Build a pool from raw secrets, naming them `key-1`, `key-2`, ...
    pub fn from_secrets(secrets: Vec<Secret>, settings: PoolSettings) -> Self {
        let credentials = secrets
            .into_iter()
            .enumerate()
            .map(|(i, secret)| Credential::new(format!("key-{}", i + 1), i, secret))
            .collect();
        Self::new(credentials, settings)
    }

    /// Replace the time source (for tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Check out the active credential's secret.
    ///
    /// Records the usage timestamp and counts the request against the active
    /// credential. Returns `None` only for an empty pool.
    pub fn current(&self) -> Option<Secret> {
        self.checkout().map(|lease| lease.secret)
    }

    /// Like [`current`](Self::current), also returning which credential was
    /// handed out so the outcome can be reported against it.
    pub fn checkout(&self) -> Option<Checkout> {
        if self.is_empty() {
            return None;
        }
        let now = self.clock.now();
        let mut state = self.lock();
        let index = state.current;
        state.statuses[index].record_checkout(now);
        let credential = &self.credentials[index];
        Some(Checkout {
            index,
            id: credential.id.clone(),
            secret: credential.secret().clone(),
        })
    }

    /// Read-only snapshot of the active credential.
    pub fn current_info(&self) -> Option<CredentialInfo> {
        if self.is_empty() {
            return None;
        }
        let state = self.lock();
        let index = state.current;
        let credential = &self.credentials[index];
        Some(CredentialInfo {
            id: credential.id.clone(),
            priority: credential.priority,
            index,
            status: state.statuses[index].clone(),
        })
    }

    /// Advance to the next credential.
    ///
    /// Refused (returns false, nothing changes) when the pool has a single
    /// credential or the cooldown since the previous rotation has not elapsed.
    pub fn rotate(&self, reason: &str) -> bool {
        let now = self.clock.now();
        let mut state = self.lock();
        self.rotate_locked(&mut state, now, reason)
    }

    /// Record a failed attempt against the active credential.
    ///
    /// Once the consecutive error count reaches the threshold the credential is
    /// marked unhealthy and the pool tries to move to a healthy one.
    pub fn report_error(&self, error: &dyn fmt::Display, latency: Duration) {
        let now = self.clock.now();
        let mut state = self.lock();
        let index = state.current;
        self.record_error_locked(&mut state, index, error, latency, now);
    }

    /// Record a failed attempt against the credential at `index`.
    ///
    /// The pool only rotates if that credential is still the active one; a late
    /// report for a credential another caller already rotated away from just
    /// updates its status. Out-of-range indexes are ignored.
    pub fn report_error_at(&self, index: usize, error: &dyn fmt::Display, latency: Duration) {
        if index >= self.credentials.len() {
            return;
        }
        let now = self.clock.now();
        let mut state = self.lock();
        self.record_error_locked(&mut state, index, error, latency, now);
    }

    /// Record a successful attempt against the active credential.
    pub fn report_success(&self, latency: Duration) {
        let mut state = self.lock();
        let index = state.current;
        self.record_success_locked(&mut state, index, latency);
    }

    /// Record a successful attempt against the credential at `index`.
    pub fn report_success_at(&self, index: usize, latency: Duration) {
        if index >= self.credentials.len() {
            return;
        }
        let mut state = self.lock();
        self.record_success_locked(&mut state, index, latency);
    }

    /// Move to the next healthy credential, if any.
    ///
    /// Returns true once a healthy credential is active. When none is found the
    /// original index is kept and false is returned.
    pub fn rotate_to_healthy(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.lock();
        self.rotate_to_healthy_locked(&mut state, now)
    }

    /// Snapshot of every credential, taken under the pool lock.
    pub fn status_report(&self) -> PoolStatusReport {
        let state = self.lock();
        let credentials = self
            .credentials
            .iter()
            .enumerate()
            .map(|(index, c)| CredentialReport {
                id: c.id.clone(),
                priority: c.priority,
                index,
                secret: c.secret().clone(),
                is_current: index == state.current,
                status: state.statuses[index].clone(),
            })
            .collect::<Vec<_>>();

        PoolStatusReport {
            current_index: state.current,
            rotation_count: state.rotation_count,
            last_rotation_at: state.last_rotation_at,
            healthy_count: state.statuses.iter().filter(|s| s.is_healthy).count(),
            credentials,
        }
    }

    /// Probe every credential in order and record the outcome.
    ///
    /// Meant for operator-triggered diagnostics. The caller must not rotate the
    /// pool manually while a check is running.
    pub async fn perform_health_check(&self, probe: &dyn HealthProbe) -> HealthCheckSummary {
        let mut results = Vec::with_capacity(self.credentials.len());

        for (index, credential) in self.credentials.iter().enumerate() {
            let start = Instant::now();
            let outcome = probe.probe(credential.secret()).await;
            let latency_ms = start.elapsed().as_millis() as u64;
            let now = self.clock.now();

            {
                let mut state = self.lock();
                match &outcome {
                    Ok(()) => state.statuses[index].record_probe_success(latency_ms),
                    Err(message) => {
                        state.statuses[index].record_probe_failure(message.clone(), latency_ms, now)
                    }
                }
            }

            tracing::debug!(
                credential_id = %credential.id,
                healthy = outcome.is_ok(),
                latency_ms,
                "Credential probed"
            );

            results.push(ProbeOutcome {
                id: credential.id.clone(),
                healthy: outcome.is_ok(),
                latency_ms,
                error: outcome.err(),
            });
        }

        let healthy = results.iter().filter(|r| r.healthy).count();
        let summary = HealthCheckSummary {
            healthy,
            unhealthy: results.len() - healthy,
            results,
        };

        tracing::info!(
            healthy = summary.healthy,
            unhealthy = summary.unhealthy,
            "Credential health check completed"
        );
        summary
    }

    fn record_error_locked(
        &self,
        state: &mut PoolState,
        index: usize,
        error: &dyn fmt::Display,
        latency: Duration,
        now: DateTime<Utc>,
    ) {
        let latency_ms = latency.as_millis() as u64;
        let reached = state.statuses[index].record_error(
            error.to_string(),
            latency_ms,
            now,
            self.settings.error_threshold,
        );

        tracing::warn!(
            credential_id = %self.credentials[index].id,
            consecutive_errors = state.statuses[index].consecutive_error_count,
            latency_ms,
            error = %error,
            "Credential attempt failed"
        );

        if reached {
            tracing::warn!(
                credential_id = %self.credentials[index].id,
                threshold = self.settings.error_threshold,
                "Credential marked unhealthy"
            );
            if index == state.current {
                self.rotate_to_healthy_locked(state, now);
            }
        }
    }

    fn record_success_locked(&self, state: &mut PoolState, index: usize, latency: Duration) {
        let was_healthy = state.statuses[index].is_healthy;
        state.statuses[index].record_success(latency.as_millis() as u64);

        if !was_healthy {
            tracing::info!(
                credential_id = %self.credentials[index].id,
                "Credential recovered"
            );
        }
    }

    fn cooldown_elapsed(&self, state: &PoolState, now: DateTime<Utc>) -> bool {
        match state.last_rotation_at {
            None => true,
            Some(last) => (now - last)
                .to_std()
                .map(|elapsed| elapsed >= self.settings.rotation_cooldown)
                .unwrap_or(false),
        }
    }

    fn rotate_locked(&self, state: &mut PoolState, now: DateTime<Utc>, reason: &str) -> bool {
        if self.credentials.len() <= 1 {
            return false;
        }
        if !self.cooldown_elapsed(state, now) {
            tracing::debug!(reason, "Rotation refused during cooldown");
            return false;
        }

        let from = state.current;
        state.current = (from + 1) % self.credentials.len();
        self.mark_rotated(state, now, from, reason);
        true
    }

    fn rotate_to_healthy_locked(&self, state: &mut PoolState, now: DateTime<Utc>) -> bool {
        let len = self.credentials.len();
        if len <= 1 || !self.cooldown_elapsed(state, now) {
            return false;
        }

        let original = state.current;
        for step in 1..len {
            let candidate = (original + step) % len;
            if state.statuses[candidate].is_healthy {
                state.current = candidate;
                self.mark_rotated(state, now, original, "unhealthy");
                return true;
            }
        }

        state.current = original;
        tracing::warn!(
            credential_id = %self.credentials[original].id,
            "No healthy credential available, keeping current"
        );
        false
    }

    fn mark_rotated(&self, state: &mut PoolState, now: DateTime<Utc>, from: usize, reason: &str) {
        state.rotation_count += 1;
        state.last_rotation_at = Some(now);
        metrics::counter!("lens_credential_rotations_total").increment(1);
        tracing::info!(
            from = %self.credentials[from].id,
            to = %self.credentials[state.current].id,
            rotation_count = state.rotation_count,
            reason,
            "Credential rotated"
        );
    }
}
