//! Credential pool with health-aware rotation.
//!
//! A [`CredentialPool`] holds an ordered set of API keys for the upstream model
//! endpoint. Every attempt checks out the active key, and the outcome is
//! reported back so the pool can track per-key health and rotate away from keys
//! that keep failing.

mod clock;
mod pool;
mod probe;
mod status;


pub use clock::*;
pub use pool::*;
pub use probe::*;
pub use status::*;

use serde::{Serialize, Serializer};
use std::fmt;

/// An opaque API key.
///
/// `Debug`, `Display` and `Serialize` all emit the masked form, so a `Secret`
/// can be put in a log field or a status report without leaking the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value, for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Masked form: first and last four characters for long keys, `****` otherwise.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 12 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", self.masked())
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.masked())
    }
}

/// A single credential. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Stable identifier used in logs and reports (e.g. "key-1")
    pub id: String,
    /// Position in the pool; lower is preferred
    pub priority: usize,
    secret: Secret,
}

impl Credential {
    pub fn new(id: impl Into<String>, priority: usize, secret: Secret) -> Self {
        Self {
            id: id.into(),
            priority,
            secret,
        }
    }

    pub fn secret(&self) -> &Secret {
        &self.secret
    }
}
