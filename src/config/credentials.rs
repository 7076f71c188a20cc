//! Credential pool settings

use crate::credential::{PoolSettings, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Credential configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    /// API keys in priority order
    #[serde(skip_serializing)]
    pub keys: Vec<String>,
    /// Consecutive errors before a key is marked unhealthy
    pub error_threshold: u32,
    /// Minimum milliseconds between two rotations
    pub rotation_cooldown_ms: u64,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            error_threshold: 3,
            rotation_cooldown_ms: 5000,
        }
    }
}

impl std::fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("keys", &self.secrets())
            .field("error_threshold", &self.error_threshold)
            .field("rotation_cooldown_ms", &self.rotation_cooldown_ms)
            .finish()
    }
}

impl CredentialSettings {
    /// Non-empty keys in order, duplicates removed.
    pub fn secrets(&self) -> Vec<Secret> {
        let mut seen = std::collections::HashSet::new();
        self.keys
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .filter(|k| seen.insert(k.to_string()))
            .map(Secret::new)
            .collect()
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            error_threshold: self.error_threshold,
            rotation_cooldown: Duration::from_millis(self.rotation_cooldown_ms),
        }
    }
}

/// Split a delimited key list (commas, semicolons or whitespace).
pub fn split_key_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
