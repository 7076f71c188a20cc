//! Health command implementation

use crate::cli::output::{format_health_json, format_health_pretty};
use crate::cli::HealthArgs;
use crate::config::LensConfig;
use crate::gateway::Gateway;

/// Handle `lens health` command
///
/// Probes every configured credential once, then renders the pool status.
pub async fn handle_health(args: &HealthArgs, config: LensConfig) -> anyhow::Result<String> {
    let gateway = Gateway::from_config(config)?;
    if gateway.pool().is_empty() {
        anyhow::bail!("No credentials configured (set LENS_API_KEY or credentials.keys)");
    }

    let summary = gateway.health_check().await?;
    let report = gateway.status_report();
    gateway.shutdown();

    if args.json {
        Ok(format_health_json(&summary, &report)?)
    } else {
        Ok(format_health_pretty(&summary, &report))
    }
}
