//! Tracing subscriber setup.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// `EnvFilter` directives for the configured levels.
///
/// Component overrides are scoped to `lens::<component>` and emitted in
/// name order.
///
/// ```
/// use lens::config::LoggingConfig;
/// use lens::logging::build_filter_directives;
///
/// let config = LoggingConfig::default().with_component("retry", "debug");
/// assert_eq!(build_filter_directives(&config), "info,lens::retry=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut directives = vec![config.level.trim().to_string()];
    directives.extend(
        config
            .component_levels
            .iter()
            .map(|(component, level)| format!("lens::{}={}", component.trim(), level.trim())),
    );
    directives.join(",")
}

/// Install the global subscriber. Output goes to stderr.
///
/// `RUST_LOG`, when set, takes precedence over the configured levels.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    if config.log_model_output {
        eprintln!("WARNING: Model output logging is enabled. Recognized exam content will be logged at debug level.");
    }

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }

    Ok(())
}
