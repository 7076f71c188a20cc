//! Config command handlers

use crate::cli::output::format_config_table;
use crate::cli::{ConfigCheckArgs, ConfigInitArgs};
use crate::config::{LensConfig, ResolveOverrides};
use serde_json::json;
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../lens.example.toml");

/// Handle `lens config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        );
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;

    println!("✓ Configuration file created: {}", args.output.display());
    println!("  Set LENS_API_KEY (or credentials.keys) before running `lens analyze`.");

    Ok(())
}

/// Handle `lens config check` command
///
/// Renders the configuration a default call would resolve to. Fails when it
/// is invalid.
pub fn handle_config_check(args: &ConfigCheckArgs, config: &LensConfig) -> anyhow::Result<String> {
    let credentials = config.credentials.secrets();
    let resolved = config.resolver().resolve(&ResolveOverrides::default())?;

    let rendered = if args.json {
        serde_json::to_string_pretty(&json!({
            "resolved": resolved,
            "credentials": credentials,
            "error_threshold": config.credentials.error_threshold,
            "rotation_cooldown_ms": config.credentials.rotation_cooldown_ms,
            "max_payload_bytes": config.gateway.max_payload_bytes,
        }))?
    } else {
        format_config_table(&resolved, credentials.len())
    };

    if resolved.is_valid() {
        Ok(rendered)
    } else {
        Err(anyhow::anyhow!(rendered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_init_creates_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output_path = temp_dir.path().join("lens.toml");

        let args = ConfigInitArgs {
            output: output_path.clone(),
            force: false,
        };

        handle_config_init(&args).unwrap();

        let content = std::fs::read_to_string(&output_path).unwrap();
        assert!(content.contains("[credentials]"));
        assert!(LensConfig::load(Some(&output_path)).is_ok());
    }

    #[test]
    fn test_config_init_no_overwrite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output_path = temp_dir.path().join("lens.toml");
        std::fs::write(&output_path, "existing").unwrap();

        let args = ConfigInitArgs {
            output: output_path.clone(),
            force: false,
        };

        assert!(handle_config_init(&args).is_err());
        let content = std::fs::read_to_string(&output_path).unwrap();
        assert_eq!(content, "existing");
    }

    #[test]
    fn test_config_init_force_overwrites() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output_path = temp_dir.path().join("lens.toml");
        std::fs::write(&output_path, "old content").unwrap();

        let args = ConfigInitArgs {
            output: output_path.clone(),
            force: true,
        };

        handle_config_init(&args).unwrap();
        let content = std::fs::read_to_string(&output_path).unwrap();
        assert!(content.contains("[model]"));
    }

    #[test]
    fn test_config_check_masks_credentials() {
        let mut config = LensConfig::default();
        config.model.endpoint = Some("https://models.example.com/v1".to_string());
        config.credentials.keys = vec!["sk-abcdefghijklmnop".to_string()];
        let args = ConfigCheckArgs {
            config: None,
            json: true,
        };

        let output = handle_config_check(&args, &config).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["resolved"]["is_valid"], true);
        assert_eq!(value["credentials"][0], "sk-a…mnop");
        assert!(!output.contains("sk-abcdefghijklmnop"));
    }

    #[test]
    fn test_config_check_reports_errors() {
        let args = ConfigCheckArgs {
            config: None,
            json: false,
        };
        let err = handle_config_check(&args, &LensConfig::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("credential"));
        assert!(message.contains("endpoint"));
    }
}
