//! Shared test utilities for Lens integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use lens::config::LensConfig;
use lens::retry::Sleeper;
use std::time::Duration;

// =============================================================================
// Well-Known Test Constants
// =============================================================================

/// UUID v4 string length: "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"
pub const UUID_V4_STRING_LEN: usize = 36;

pub const KEY_1: &str = "sk-integration-key-0001";
pub const KEY_2: &str = "sk-integration-key-0002";
pub const KEY_3: &str = "sk-integration-key-0003";

/// Small base64 payload ("hello")
pub const INLINE_IMAGE: &str = "aGVsbG8=";

pub const ANALYSIS_JSON: &str = r#"{"recognizedText":"What is 6 x 7?","confidence":0.95,"questionType":"calculation","subject":"math","difficulty":1,"keyPoints":["multiplication"],"suggestedAnswer":"42"}"#;

// =============================================================================
// Builders
// =============================================================================

/// Config pointing at `endpoint` with the given keys, threshold 2 and no cooldown.
pub fn lens_config(endpoint: &str, keys: &[&str]) -> LensConfig {
    let mut config = LensConfig::default();
    config.model.endpoint = Some(endpoint.to_string());
    config.model.timeout_seconds = Some(5);
    config.credentials.keys = keys.iter().map(|k| k.to_string()).collect();
    config.credentials.error_threshold = 2;
    config.credentials.rotation_cooldown_ms = 0;
    config
}

/// OpenAI-style chat completion body wrapping `content`.
pub fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "qwen-vl-max",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

pub fn bearer(key: &str) -> String {
    format!("Bearer {}", key)
}

/// Sleeper that returns immediately so retry tests run fast.
pub struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}
