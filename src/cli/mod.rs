//! CLI module for Lens
//!
//! Command-line interface definitions and handlers for the Lens gateway.
//!
//! # Commands
//!
//! - `analyze` - Analyze one photographed question
//! - `health` - Probe every credential and show pool status
//! - `config` - Configuration utilities (init, check)
//!
//! # Example
//!
//! ```bash
//! # Analyze a stored image
//! lens analyze --image-url https://cdn.example.com/q/17.jpg
//!
//! # Analyze a base64 file, JSON output, no retries
//! lens analyze --encoded-file question.b64 --max-retries 0 --json
//!
//! # Show which credentials currently work
//! lens health --config lens.toml
//! ```

pub mod analyze;
pub mod config;
pub mod health;
pub mod output;

pub use analyze::handle_analyze;
pub use config::{handle_config_check, handle_config_init};
pub use health::handle_health;

use crate::config::LensConfig;
use crate::invocation::ProcessingMode;
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Lens - resilient vision model gateway
#[derive(Parser, Debug)]
#[command(
    name = "lens",
    version,
    about = "Resilient vision model gateway for exam question analysis"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze one photographed question
    Analyze(AnalyzeArgs),
    /// Probe credentials and show pool status
    Health(HealthArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// URL or storage reference of the image
    #[arg(long, conflicts_with = "encoded_file", required_unless_present = "encoded_file")]
    pub image_url: Option<String>,

    /// File containing the base64-encoded image
    #[arg(long)]
    pub encoded_file: Option<PathBuf>,

    /// Processing mode (complete, text_only, question_generation)
    #[arg(short, long, default_value = "complete")]
    pub mode: ProcessingMode,

    /// Fail instead of returning a mock result when configuration is invalid
    #[arg(long)]
    pub strict: bool,

    /// Use only the primary credential
    #[arg(long)]
    pub no_rotation: bool,

    /// Per-attempt timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Retries after the first attempt
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Correlation id echoed in the response
    #[arg(long)]
    pub request_id: Option<String>,

    /// Path to configuration file
    #[arg(short, long, env = "LENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Path to configuration file
    #[arg(short, long, env = "LENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init(ConfigInitArgs),
    /// Show the resolved configuration and its validation errors
    Check(ConfigCheckArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "lens.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ConfigCheckArgs {
    /// Path to configuration file
    #[arg(short, long, env = "LENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Load the file (if any), apply `LENS_*` overrides, and validate.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<LensConfig> {
    let config = LensConfig::load(path)
        .with_context(|| match path {
            Some(p) => format!("Failed to load {}", p.display()),
            None => "Failed to load configuration".to_string(),
        })?
        .with_env_overrides();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze_with_url() {
        let cli = Cli::try_parse_from([
            "lens",
            "analyze",
            "--image-url",
            "https://cdn.example.com/q.jpg",
            "--mode",
            "text_only",
            "--max-retries",
            "0",
            "--no-rotation",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.image_url.as_deref(), Some("https://cdn.example.com/q.jpg"));
                assert_eq!(args.mode, ProcessingMode::TextOnly);
                assert_eq!(args.max_retries, Some(0));
                assert!(args.no_rotation);
                assert!(!args.strict);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_analyze_requires_a_source() {
        assert!(Cli::try_parse_from(["lens", "analyze"]).is_err());
    }

    #[test]
    fn test_analyze_sources_conflict() {
        let result = Cli::try_parse_from([
            "lens",
            "analyze",
            "--image-url",
            "https://cdn.example.com/q.jpg",
            "--encoded-file",
            "q.b64",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_config_init_defaults() {
        let cli = Cli::try_parse_from(["lens", "config", "init"]).unwrap();
        match cli.command {
            Commands::Config(ConfigCommands::Init(args)) => {
                assert_eq!(args.output, PathBuf::from("lens.toml"));
                assert!(!args.force);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
