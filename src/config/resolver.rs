//! Per-call invocation configuration resolution.
//!
//! Precedence, highest first:
//!
//! 1. [`ResolveOverrides`] supplied by the call site
//! 2. External settings (config file and `LENS_*` environment)
//! 3. Built-in defaults
//!
//! There is deliberately no default endpoint and no default credential: a
//! deployment that supplies neither resolves to an invalid configuration.

use super::{ConfigError, ModelSettings};
use crate::credential::{CredentialPool, Secret};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "qwen-vl-max";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 2;

pub const MIN_TIMEOUT: Duration = Duration::from_secs(5);
pub const MAX_TIMEOUT: Duration = Duration::from_secs(120);
pub const MAX_RETRIES_LIMIT: u32 = 5;

/// Call-site overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOverrides {
    /// Per-attempt deadline
    pub timeout: Option<Duration>,
    /// Retries after the first attempt
    pub max_retries: Option<u32>,
    /// Return `Err` instead of an invalid configuration
    pub strict: bool,
    /// Attach the shared credential pool
    pub enable_rotation: bool,
}

impl Default for ResolveOverrides {
    fn default() -> Self {
        Self {
            timeout: None,
            max_retries: None,
            strict: false,
            enable_rotation: true,
        }
    }
}

/// Resolved settings for one invocation.
///
/// Built fresh by [`ConfigResolver::resolve`] and read through accessors only.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationConfig {
    pub(crate) endpoint: String,
    pub(crate) model: String,
    #[serde(rename = "timeout_seconds", serialize_with = "serialize_secs")]
    pub(crate) timeout: Duration,
    pub(crate) max_retries: u32,
    pub(crate) is_valid: bool,
    pub(crate) errors: Vec<String>,
    #[serde(skip)]
    pub(crate) pool: Option<Arc<CredentialPool>>,
    pub(crate) primary_credential: Option<Secret>,
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_secs())
}

impl InvocationConfig {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Validation errors in the order they were found.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// The bound pool, or `None` when rotation is disabled for this call.
    pub fn pool(&self) -> Option<&Arc<CredentialPool>> {
        self.pool.as_ref()
    }

    /// Credential used when no pool is bound.
    pub fn primary_credential(&self) -> Option<&Secret> {
        self.primary_credential.as_ref()
    }

    pub fn rotation_enabled(&self) -> bool {
        self.pool.is_some()
    }
}

/// Builds [`InvocationConfig`]s from external settings and call overrides.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    settings: ModelSettings,
    credentials: Vec<Secret>,
    pool: Option<Arc<CredentialPool>>,
}

impl ConfigResolver {
    pub fn new(settings: ModelSettings, credentials: Vec<Secret>) -> Self {
        Self {
            settings,
            credentials,
            pool: None,
        }
    }

    /// Bind the shared pool handed to every rotation-enabled resolution.
    pub fn with_pool(mut self, pool: Arc<CredentialPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn pool(&self) -> Option<&Arc<CredentialPool>> {
        self.pool.as_ref()
    }

    /// Resolve the configuration for one call.
    ///
    /// In permissive mode (the default) validation failures are reported via
    /// `is_valid == false` and [`InvocationConfig::errors`]. In strict mode
    /// they are returned as [`ConfigError::Invalid`].
    pub fn resolve(&self, overrides: &ResolveOverrides) -> Result<InvocationConfig, ConfigError> {
        let endpoint = self
            .settings
            .endpoint
            .as_deref()
            .map(|e| e.trim().trim_end_matches('/').to_string())
            .unwrap_or_default();
        let model = self
            .settings
            .model
            .as_deref()
            .map(|m| m.trim().to_string())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout = overrides
            .timeout
            .or(self.settings.timeout_seconds.map(Duration::from_secs))
            .unwrap_or(DEFAULT_TIMEOUT);
        let max_retries = overrides
            .max_retries
            .or(self.settings.max_retries)
            .unwrap_or(DEFAULT_MAX_RETRIES);

        let pool = if overrides.enable_rotation {
            self.pool.clone().filter(|p| !p.is_empty())
        } else {
            None
        };
        let primary_credential = self.credentials.iter().find(|s| !s.is_empty()).cloned();

        let mut errors = Vec::new();
        if primary_credential.is_none() && pool.is_none() {
            errors.push(
                "no API credential configured (set LENS_API_KEY or credentials.keys)".to_string(),
            );
        }
        if endpoint.is_empty() {
            errors.push("endpoint must not be empty (set LENS_ENDPOINT or model.endpoint)".to_string());
        }
        if model.is_empty() {
            errors.push("model identifier must not be empty".to_string());
        }
        if timeout < MIN_TIMEOUT || timeout > MAX_TIMEOUT {
            errors.push(format!(
                "timeout must be between {}s and {}s (got {}s)",
                MIN_TIMEOUT.as_secs(),
                MAX_TIMEOUT.as_secs(),
                timeout.as_secs_f64()
            ));
        }
        if max_retries > MAX_RETRIES_LIMIT {
            errors.push(format!(
                "max_retries must be between 0 and {} (got {})",
                MAX_RETRIES_LIMIT, max_retries
            ));
        }

        if !errors.is_empty() {
            if overrides.strict {
                return Err(ConfigError::Invalid { errors });
            }
            tracing::warn!(errors = ?errors, "Invocation configuration is invalid");
        }

        Ok(InvocationConfig {
            endpoint,
            model,
            timeout,
            max_retries,
            is_valid: errors.is_empty(),
            errors,
            pool,
            primary_credential,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::PoolSettings;

    fn settings() -> ModelSettings {
        ModelSettings {
            endpoint: Some("https://models.example.com/v1/".to_string()),
            model: Some("qwen-vl-plus".to_string()),
            timeout_seconds: Some(20),
            max_retries: Some(3),
        }
    }

    fn keys() -> Vec<Secret> {
        vec![Secret::new("sk-primary-0001"), Secret::new("sk-secondary-0002")]
    }

    #[test]
    fn test_resolve_uses_external_settings() {
        let resolver = ConfigResolver::new(settings(), keys());
        let config = resolver.resolve(&ResolveOverrides::default()).unwrap();

        assert!(config.is_valid());
        assert!(config.errors().is_empty());
        assert_eq!(config.endpoint(), "https://models.example.com/v1");
        assert_eq!(config.model(), "qwen-vl-plus");
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.max_retries(), 3);
        assert_eq!(
            config.primary_credential().unwrap().expose(),
            "sk-primary-0001"
        );
    }

    #[test]
    fn test_resolve_applies_defaults() {
        let resolver = ConfigResolver::new(
            ModelSettings {
                endpoint: Some("https://models.example.com/v1".to_string()),
                ..Default::default()
            },
            keys(),
        );
        let config = resolver.resolve(&ResolveOverrides::default()).unwrap();

        assert!(config.is_valid());
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.max_retries(), DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let resolver = ConfigResolver::new(settings(), keys());
        let overrides = ResolveOverrides {
            timeout: Some(Duration::from_secs(60)),
            max_retries: Some(0),
            ..Default::default()
        };
        let config = resolver.resolve(&overrides).unwrap();

        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.max_retries(), 0);
    }

    #[test]
    fn test_missing_credential_and_endpoint_is_invalid() {
        let resolver = ConfigResolver::new(ModelSettings::default(), vec![]);
        let config = resolver.resolve(&ResolveOverrides::default()).unwrap();

        assert!(!config.is_valid());
        assert!(config.errors().len() >= 2);
        assert!(config.errors()[0].contains("credential"));
        assert!(config.errors()[1].contains("endpoint"));
        assert_ne!(config.errors()[0], config.errors()[1]);
    }

    #[test]
    fn test_strict_mode_returns_error() {
        let resolver = ConfigResolver::new(ModelSettings::default(), vec![]);
        let overrides = ResolveOverrides {
            strict: true,
            ..Default::default()
        };
        let result = resolver.resolve(&overrides);

        match result {
            Err(ConfigError::Invalid { errors }) => assert!(errors.len() >= 2),
            other => panic!("expected ConfigError::Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_credentials_do_not_count() {
        let resolver = ConfigResolver::new(settings(), vec![Secret::new("   ")]);
        let config = resolver.resolve(&ResolveOverrides::default()).unwrap();
        assert!(!config.is_valid());
        assert!(config.primary_credential().is_none());
    }

    #[test]
    fn test_timeout_bounds() {
        let resolver = ConfigResolver::new(settings(), keys());
        for (secs, valid) in [(4, false), (5, true), (120, true), (121, false)] {
            let overrides = ResolveOverrides {
                timeout: Some(Duration::from_secs(secs)),
                ..Default::default()
            };
            let config = resolver.resolve(&overrides).unwrap();
            assert_eq!(config.is_valid(), valid, "timeout {}s", secs);
        }
    }

    #[test]
    fn test_retry_budget_bounds() {
        let resolver = ConfigResolver::new(settings(), keys());
        let config = resolver
            .resolve(&ResolveOverrides {
                max_retries: Some(5),
                ..Default::default()
            })
            .unwrap();
        assert!(config.is_valid());

        let config = resolver
            .resolve(&ResolveOverrides {
                max_retries: Some(6),
                ..Default::default()
            })
            .unwrap();
        assert!(!config.is_valid());
        assert!(config.errors()[0].contains("max_retries"));
    }

    #[test]
    fn test_empty_model_is_invalid() {
        let mut s = settings();
        s.model = Some("  ".to_string());
        let resolver = ConfigResolver::new(s, keys());
        let config = resolver.resolve(&ResolveOverrides::default()).unwrap();
        assert!(!config.is_valid());
        assert!(config.errors()[0].contains("model"));
    }

    #[test]
    fn test_pool_binding_follows_enable_rotation() {
        let pool = Arc::new(CredentialPool::from_secrets(keys(), PoolSettings::default()));
        let resolver = ConfigResolver::new(settings(), keys()).with_pool(Arc::clone(&pool));

        let config = resolver.resolve(&ResolveOverrides::default()).unwrap();
        assert!(config.rotation_enabled());
        assert!(Arc::ptr_eq(config.pool().unwrap(), &pool));

        let config = resolver
            .resolve(&ResolveOverrides {
                enable_rotation: false,
                ..Default::default()
            })
            .unwrap();
        assert!(!config.rotation_enabled());
        assert!(config.is_valid());
    }

    #[test]
    fn test_serialized_config_masks_credential() {
        let resolver = ConfigResolver::new(
            settings(),
            vec![Secret::new("sk-abcdefghijklmnopqrst")],
        );
        let config = resolver.resolve(&ResolveOverrides::default()).unwrap();
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["timeout_seconds"], 20);
        assert_eq!(json["primary_credential"], "sk-a…qrst");
    }
}
