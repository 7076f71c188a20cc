//! Gateway request handling settings

use serde::{Deserialize, Serialize};

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Largest accepted inline payload (encoded bytes)
    pub max_payload_bytes: usize,
    /// Provider label reported in responses
    pub provider: String,
    /// Base delay of the linear retry backoff
    pub backoff_step_ms: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            max_payload_bytes: 10 * 1024 * 1024,
            provider: "openai-compatible".to_string(),
            backoff_step_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_settings_defaults() {
        let settings = GatewaySettings::default();
        assert_eq!(settings.max_payload_bytes, 10_485_760);
        assert_eq!(settings.provider, "openai-compatible");
        assert_eq!(settings.backoff_step_ms, 1000);
    }
}
