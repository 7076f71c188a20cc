//! Upstream model settings

use serde::{Deserialize, Serialize};

/// Externally supplied model settings.
///
/// Every field is optional: anything left unset falls back to the built-in
/// defaults applied by the [`ConfigResolver`](super::ConfigResolver).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Base URL of the OpenAI-compatible API (e.g. "https://host/compatible-mode/v1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Vision model identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Per-attempt deadline in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    /// Retries after the first attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}
