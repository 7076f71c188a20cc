//! Configuration module for Lens
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments and per-call overrides (highest priority)
//! 2. Environment variables (`LENS_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use lens::config::LensConfig;
//!
//! let toml = r#"
//! [model]
//! endpoint = "https://models.example.com/v1"
//! timeout_seconds = 45
//! "#;
//! let config: LensConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.model.timeout_seconds, Some(45));
//! assert_eq!(config.credentials.error_threshold, 3);
//! ```

pub mod credentials;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod resolver;

pub use credentials::{split_key_list, CredentialSettings};
pub use error::ConfigError;
pub use gateway::GatewaySettings;
pub use logging::{LogFormat, LoggingConfig};
pub use model::ModelSettings;
pub use resolver::{ConfigResolver, InvocationConfig, ResolveOverrides};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LensConfig {
    /// Upstream model endpoint settings
    pub model: ModelSettings,
    /// API keys and rotation policy
    pub credentials: CredentialSettings,
    /// Request handling limits
    pub gateway: GatewaySettings,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl LensConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply `LENS_*` environment variable overrides.
    ///
    /// Invalid numeric values are silently ignored (file/default values are kept).
    pub fn with_env_overrides(self) -> Self {
        self.with_env_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup` instead of the process environment.
    pub fn with_env_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Credentials: primary/secondary/tertiary, then the delimited list
        let mut keys = Vec::new();
        for name in ["LENS_API_KEY", "LENS_API_KEY_2", "LENS_API_KEY_3"] {
            if let Some(key) = lookup(name) {
                keys.extend(split_key_list(&key));
            }
        }
        if let Some(list) = lookup("LENS_API_KEYS") {
            keys.extend(split_key_list(&list));
        }
        if !keys.is_empty() {
            self.credentials.keys = keys;
        }

        // Model settings
        if let Some(endpoint) = lookup("LENS_ENDPOINT") {
            self.model.endpoint = Some(endpoint);
        }
        if let Some(model) = lookup("LENS_MODEL") {
            self.model.model = Some(model);
        }
        if let Some(timeout) = lookup("LENS_TIMEOUT_SECONDS") {
            if let Ok(t) = timeout.trim().parse() {
                self.model.timeout_seconds = Some(t);
            }
        }
        if let Some(retries) = lookup("LENS_MAX_RETRIES") {
            if let Ok(r) = retries.trim().parse() {
                self.model.max_retries = Some(r);
            }
        }

        // Logging settings
        if let Some(level) = lookup("LENS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LENS_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate structural settings.
    ///
    /// Invocation settings (endpoint, credentials, timeout, retries) are checked
    /// per call by the [`ConfigResolver`] instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.credentials.error_threshold == 0 {
            return Err(ConfigError::Validation {
                field: "credentials.error_threshold".to_string(),
                message: "threshold must be at least 1".to_string(),
            });
        }
        if self.gateway.max_payload_bytes == 0 {
            return Err(ConfigError::Validation {
                field: "gateway.max_payload_bytes".to_string(),
                message: "limit must be non-zero".to_string(),
            });
        }
        if self.gateway.provider.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "gateway.provider".to_string(),
                message: "provider label cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Resolver over this configuration's model settings and keys (no pool bound).
    pub fn resolver(&self) -> ConfigResolver {
        ConfigResolver::new(self.model.clone(), self.credentials.secrets())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_lens_config_defaults() {
        let config = LensConfig::default();
        assert!(config.model.endpoint.is_none());
        assert!(config.credentials.keys.is_empty());
        assert_eq!(config.credentials.error_threshold, 3);
        assert_eq!(config.credentials.rotation_cooldown_ms, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_full_toml() {
        let toml = include_str!("../../lens.example.toml");
        let config: LensConfig = toml::from_str(toml).unwrap();
        assert!(config.model.endpoint.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            temp.path(),
            "[credentials]\nkeys = [\"sk-a\", \"sk-b\"]\nerror_threshold = 2",
        )
        .unwrap();

        let config = LensConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.credentials.keys.len(), 2);
        assert_eq!(config.credentials.error_threshold, 2);
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = LensConfig::load(Some(Path::new("/nonexistent/lens.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[model\nendpoint = ").unwrap();
        let result = LensConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_load_none_returns_defaults() {
        let config = LensConfig::load(None).unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_env_credentials_in_priority_order() {
        let config = LensConfig::default().with_env_overrides_from(env(&[
            ("LENS_API_KEY", "sk-primary"),
            ("LENS_API_KEY_2", "sk-secondary"),
            ("LENS_API_KEY_3", "sk-tertiary"),
            ("LENS_API_KEYS", "sk-four,sk-five"),
        ]));
        assert_eq!(
            config.credentials.keys,
            vec!["sk-primary", "sk-secondary", "sk-tertiary", "sk-four", "sk-five"]
        );
    }

    #[test]
    fn test_env_credentials_replace_file_keys() {
        let mut config = LensConfig::default();
        config.credentials.keys = vec!["sk-from-file".to_string()];
        let config = config.with_env_overrides_from(env(&[("LENS_API_KEYS", "sk-env")]));
        assert_eq!(config.credentials.keys, vec!["sk-env"]);
    }

    #[test]
    fn test_no_env_credentials_keeps_file_keys() {
        let mut config = LensConfig::default();
        config.credentials.keys = vec!["sk-from-file".to_string()];
        let config = config.with_env_overrides_from(env(&[]));
        assert_eq!(config.credentials.keys, vec!["sk-from-file"]);
    }

    #[test]
    fn test_env_model_overrides() {
        let config = LensConfig::default().with_env_overrides_from(env(&[
            ("LENS_ENDPOINT", "https://env.example.com/v1"),
            ("LENS_MODEL", "qwen-vl-plus"),
            ("LENS_TIMEOUT_SECONDS", "15"),
            ("LENS_MAX_RETRIES", "1"),
        ]));
        assert_eq!(
            config.model.endpoint.as_deref(),
            Some("https://env.example.com/v1")
        );
        assert_eq!(config.model.model.as_deref(), Some("qwen-vl-plus"));
        assert_eq!(config.model.timeout_seconds, Some(15));
        assert_eq!(config.model.max_retries, Some(1));
    }

    #[test]
    fn test_env_invalid_numbers_ignored() {
        let mut config = LensConfig::default();
        config.model.timeout_seconds = Some(40);
        let config = config.with_env_overrides_from(env(&[
            ("LENS_TIMEOUT_SECONDS", "soon"),
            ("LENS_MAX_RETRIES", "-1"),
        ]));
        assert_eq!(config.model.timeout_seconds, Some(40));
        assert!(config.model.max_retries.is_none());
    }

    #[test]
    fn test_env_log_format() {
        let config =
            LensConfig::default().with_env_overrides_from(env(&[("LENS_LOG_FORMAT", "json")]));
        assert_eq!(config.logging.format, LogFormat::Json);

        let config =
            LensConfig::default().with_env_overrides_from(env(&[("LENS_LOG_FORMAT", "xml")]));
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_validation_zero_threshold() {
        let mut config = LensConfig::default();
        config.credentials.error_threshold = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "credentials.error_threshold"
        ));
    }

    #[test]
    fn test_validation_zero_payload_limit() {
        let mut config = LensConfig::default();
        config.gateway.max_payload_bytes = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field.contains("max_payload_bytes")
        ));
    }

    #[test]
    fn test_resolver_from_config() {
        let config = LensConfig::default().with_env_overrides_from(env(&[
            ("LENS_API_KEY", "sk-primary"),
            ("LENS_ENDPOINT", "https://env.example.com/v1"),
        ]));
        let resolved = config
            .resolver()
            .resolve(&ResolveOverrides::default())
            .unwrap();
        assert!(resolved.is_valid());
        assert!(!resolved.rotation_enabled());
    }
}
