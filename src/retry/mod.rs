//! Bounded retry loop over single model attempts.
//!
//! Each attempt checks out the pool's current credential (or the configuration's
//! primary credential when rotation is off), reports the outcome back to the
//! pool, and waits according to the [`BackoffStrategy`] before the next
//! transient retry. Permanent failures stop the loop immediately.

use crate::config::InvocationConfig;
use crate::credential::Secret;
use crate::invocation::{FailureKind, InvocationError};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Delay before retry number `attempt + 1`.
pub trait BackoffStrategy: Send + Sync {
    /// `attempt` is the zero-based index of the attempt that just failed.
    fn delay(&self, attempt: u32) -> Duration;
}

/// `step * (attempt + 1)`: 1s, 2s, 3s, ... with the default step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBackoff {
    step: Duration,
}

impl LinearBackoff {
    pub fn new(step: Duration) -> Self {
        Self { step }
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl BackoffStrategy for LinearBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt.saturating_add(1))
    }
}

/// Waits between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Successful result of [`RetryOrchestrator::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome {
    /// Raw model text
    pub content: String,
    /// Attempts used, including the successful one
    pub attempts: u32,
    /// Credential that produced the result
    pub credential_id: String,
}

/// Why the retry loop gave up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryError {
    /// Neither a pool nor a primary credential was available.
    #[error("No credential available for invocation")]
    NoCredential,

    /// A permanent failure stopped the loop.
    #[error("Aborted after {attempts} attempt(s): {last}")]
    Aborted { attempts: u32, last: InvocationError },

    /// Every allowed attempt failed transiently.
    #[error("Retry budget exhausted after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: InvocationError },
}

impl RetryError {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::NoCredential => 0,
            RetryError::Aborted { attempts, .. } | RetryError::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn last_error(&self) -> Option<&InvocationError> {
        match self {
            RetryError::NoCredential => None,
            RetryError::Aborted { last, .. } | RetryError::Exhausted { last, .. } => Some(last),
        }
    }

    /// Short label used for fallback metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            RetryError::NoCredential => "no_credential",
            RetryError::Aborted { .. } => "permanent_error",
            RetryError::Exhausted { .. } => "retries_exhausted",
        }
    }
}

/// Runs up to `max_retries + 1` attempts for one invocation.
#[derive(Clone)]
pub struct RetryOrchestrator {
    backoff: Arc<dyn BackoffStrategy>,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for RetryOrchestrator {
    fn default() -> Self {
        Self::new(Arc::new(LinearBackoff::default()), Arc::new(TokioSleeper))
    }
}

impl std::fmt::Debug for RetryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryOrchestrator").finish_non_exhaustive()
    }
}

impl RetryOrchestrator {
    pub fn new(backoff: Arc<dyn BackoffStrategy>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { backoff, sleeper }
    }

    /// Drive `call` until it succeeds, fails permanently, or the budget runs out.
    ///
    /// The credential pool bound to `config` (if any) receives a success or
    /// error report after every attempt, so later attempts may run with a
    /// different credential after a threshold rotation.
    pub async fn execute<F, Fut>(
        &self,
        config: &InvocationConfig,
        mut call: F,
    ) -> Result<RetryOutcome, RetryError>
    where
        F: FnMut(Secret) -> Fut,
        Fut: Future<Output = Result<String, InvocationError>>,
    {
        let pool = config.pool();
        let max_retries = config.max_retries();
        let mut attempt: u32 = 0;

        loop {
            // Outcomes are reported against the credential actually used, which
            // may no longer be the active one when the attempt returns.
            let (lease, credential_id, secret) = match pool {
                Some(pool) => pool
                    .checkout()
                    .map(|lease| (Some(lease.index), lease.id, lease.secret)),
                None => config
                    .primary_credential()
                    .map(|secret| (None, "primary".to_string(), secret.clone())),
            }
            .ok_or(RetryError::NoCredential)?;

            tracing::debug!(
                attempt = attempt + 1,
                max_attempts = max_retries + 1,
                credential_id = %credential_id,
                "Invoking model"
            );

            let started = Instant::now();
            let result = call(secret).await;
            let latency = started.elapsed();
            metrics::histogram!("lens_attempt_latency_seconds").record(latency.as_secs_f64());

            let err = match result {
                Ok(content) => {
                    if let (Some(pool), Some(index)) = (pool, lease) {
                        pool.report_success_at(index, latency);
                    }
                    metrics::counter!("lens_attempts_total", "class" => "success").increment(1);
                    tracing::debug!(
                        attempt = attempt + 1,
                        credential_id = %credential_id,
                        latency_ms = latency.as_millis() as u64,
                        "Model attempt succeeded"
                    );
                    return Ok(RetryOutcome {
                        content,
                        attempts: attempt + 1,
                        credential_id,
                    });
                }
                Err(err) => err,
            };

            // Cancellation by teardown is not recorded against the credential.
            let cancelled = matches!(err.kind(), FailureKind::Cancelled);
            if let (Some(pool), Some(index), false) = (pool, lease, cancelled) {
                pool.report_error_at(index, &err, latency);
            }
            metrics::counter!("lens_attempts_total", "class" => err.class().as_str())
                .increment(1);

            let attempts = attempt + 1;
            if !err.is_transient() {
                tracing::warn!(
                    attempts,
                    credential_id = %credential_id,
                    error = %err,
                    "Permanent failure, not retrying"
                );
                return Err(RetryError::Aborted {
                    attempts,
                    last: err,
                });
            }
            if attempt >= max_retries {
                tracing::warn!(
                    attempts,
                    credential_id = %credential_id,
                    error = %err,
                    "Retry budget exhausted"
                );
                return Err(RetryError::Exhausted {
                    attempts,
                    last: err,
                });
            }

            let delay = self.backoff.delay(attempt);
            tracing::info!(
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                credential_id = %credential_id,
                error = %err,
                "Transient failure, retrying"
            );
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}
