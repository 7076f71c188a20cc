//! Error types for model invocation.

use serde::Serialize;
use thiserror::Error;

/// What went wrong during a single attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Attempt exceeded its deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Connection-level failure (DNS, refused, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream returned a non-2xx status.
    #[error("Upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// 2xx response without any content.
    #[error("Model returned an empty response")]
    EmptyResponse,

    /// 2xx response that could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Gateway shut down while the attempt was in flight.
    #[error("Invocation cancelled")]
    Cancelled,
}

/// Coarse retry class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorClass {
    Transient,
    Permanent,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Transient => "transient",
            ErrorClass::Permanent => "permanent",
        }
    }
}

/// A classified attempt failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    /// Worth retrying, possibly with another credential.
    #[error("{0}")]
    Transient(FailureKind),

    /// Retrying cannot help.
    #[error("{0}")]
    Permanent(FailureKind),
}

impl InvocationError {
    /// Classify a failure kind.
    ///
    /// Timeouts, network failures, 5xx and 429 are transient. Every other
    /// failure is permanent.
    pub fn classify(kind: FailureKind) -> Self {
        match &kind {
            FailureKind::Timeout(_) | FailureKind::Network(_) => Self::Transient(kind),
            FailureKind::Upstream { status, .. } if *status >= 500 || *status == 429 => {
                Self::Transient(kind)
            }
            _ => Self::Permanent(kind),
        }
    }

    /// Classify a non-2xx HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::classify(FailureKind::Upstream {
            status,
            message: message.into(),
        })
    }

    pub fn kind(&self) -> &FailureKind {
        match self {
            Self::Transient(kind) | Self::Permanent(kind) => kind,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Transient(_) => ErrorClass::Transient,
            Self::Permanent(_) => ErrorClass::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_and_rate_limits_are_transient() {
        for status in [500, 502, 503, 504, 429] {
            assert!(
                InvocationError::from_status(status, "busy").is_transient(),
                "status {}",
                status
            );
        }
    }

    #[test]
    fn test_client_errors_are_permanent() {
        for status in [400, 401, 403, 404, 422] {
            let err = InvocationError::from_status(status, "bad");
            assert_eq!(err.class(), ErrorClass::Permanent, "status {}", status);
        }
    }

    #[test]
    fn test_timeout_and_network_are_transient() {
        assert!(InvocationError::classify(FailureKind::Timeout(30_000)).is_transient());
        assert!(InvocationError::classify(FailureKind::Network("reset".into())).is_transient());
    }

    #[test]
    fn test_bad_bodies_and_cancellation_are_permanent() {
        assert!(!InvocationError::classify(FailureKind::EmptyResponse).is_transient());
        assert!(
            !InvocationError::classify(FailureKind::InvalidResponse("eof".into())).is_transient()
        );
        assert!(!InvocationError::classify(FailureKind::Cancelled).is_transient());
    }

    #[test]
    fn test_display_delegates_to_kind() {
        let err = InvocationError::from_status(503, "overloaded");
        assert_eq!(err.to_string(), "Upstream error 503: overloaded");
        assert_eq!(err.class().as_str(), "transient");
    }
}
