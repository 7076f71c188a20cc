//! Deadline and cancellation scope for a single attempt.

use super::{FailureKind, InvocationError};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Bounds one network attempt by a hard deadline and the gateway's shutdown token.
///
/// Whichever finishes first wins; the losing future is dropped, which aborts
/// an in-flight HTTP request and releases its connection.
#[derive(Debug, Clone)]
pub struct CallContext {
    deadline: Instant,
    timeout: Duration,
    cancel: CancellationToken,
}

impl CallContext {
    pub fn new(timeout: Duration, cancel: CancellationToken) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            timeout,
            cancel,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Time left before the deadline (zero once passed).
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive `fut` to completion unless the deadline passes or the token fires.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, InvocationError>
    where
        F: Future<Output = Result<T, InvocationError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(InvocationError::classify(FailureKind::Cancelled));
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                Err(InvocationError::classify(FailureKind::Cancelled))
            }
            result = tokio::time::timeout_at(self.deadline, fut) => match result {
                Ok(inner) => inner,
                Err(_) => Err(InvocationError::classify(FailureKind::Timeout(
                    self.timeout.as_millis() as u64,
                ))),
            },
        }
    }
}
