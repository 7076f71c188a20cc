//! Output formatting helpers for CLI commands

use crate::analysis::Provenance;
use crate::config::InvocationConfig;
use crate::credential::{HealthCheckSummary, PoolStatusReport};
use crate::gateway::AnalyzeResponse;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;

/// Format the credential pool as a table
pub fn format_pool_table(report: &PoolStatusReport) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "", "ID", "Key", "Status", "Errors", "Requests", "Success", "Latency", "Last Error",
    ]);

    for c in &report.credentials {
        let status_str = if c.status.is_healthy {
            "Healthy".green().to_string()
        } else {
            "Unhealthy".red().to_string()
        };
        let success = c
            .status
            .success_rate()
            .map(|r| format!("{:.0}%", r * 100.0))
            .unwrap_or_else(|| "-".to_string());
        let latency = c
            .status
            .last_latency_ms
            .map(|ms| format!("{}ms", ms))
            .unwrap_or_else(|| "-".to_string());
        let last_error = c
            .status
            .last_error
            .as_ref()
            .map(|e| e.message.clone())
            .unwrap_or_default();

        table.add_row(vec![
            Cell::new(if c.is_current { "▶" } else { "" }),
            Cell::new(&c.id),
            Cell::new(c.secret.masked()),
            Cell::new(status_str),
            Cell::new(c.status.consecutive_error_count),
            Cell::new(c.status.total_requests),
            Cell::new(success),
            Cell::new(latency),
            Cell::new(last_error),
        ]);
    }

    table.to_string()
}

/// Format a health check as pretty text
pub fn format_health_pretty(summary: &HealthCheckSummary, report: &PoolStatusReport) -> String {
    let mut output = String::new();
    let total = summary.healthy + summary.unhealthy;

    let status_display = if summary.unhealthy == 0 && total > 0 {
        "Healthy".green()
    } else if summary.healthy > 0 {
        "Degraded".yellow()
    } else {
        "Unavailable".red()
    };

    output.push_str(&format!("Status: {}\n", status_display));
    output.push_str(&format!("Credentials: {}/{} healthy\n", summary.healthy, total));
    output.push_str(&format!("Rotations: {}\n", report.rotation_count));
    output.push('\n');
    output.push_str(&format_pool_table(report));

    output
}

#[derive(Serialize)]
struct HealthJson<'a> {
    summary: &'a HealthCheckSummary,
    pool: &'a PoolStatusReport,
}

/// Format a health check as JSON
pub fn format_health_json(
    summary: &HealthCheckSummary,
    report: &PoolStatusReport,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&HealthJson {
        summary,
        pool: report,
    })
}

/// Format an analysis response as pretty text
pub fn format_analysis_pretty(response: &AnalyzeResponse) -> String {
    let mut output = String::new();

    let success = match response {
        AnalyzeResponse::Success(success) => success,
        AnalyzeResponse::Failure(failure) => {
            return format!(
                "{} {}: {}\n",
                "✗".red(),
                failure.error.code,
                failure.error.message
            );
        }
    };
    let result = &success.result;

    let source = match result.provenance {
        Provenance::Live => "live".green(),
        Provenance::Mock => "mock (degraded)".yellow(),
    };
    output.push_str(&format!("Result: {}\n", source));
    output.push_str(&format!("Request: {}\n", success.request_id));
    output.push_str(&format!(
        "Model: {} via {} ({}ms)\n",
        success.model_version, success.provider, success.processing_time_ms
    ));
    output.push('\n');

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec![Cell::new("Text"), Cell::new(&result.recognized_text)]);
    table.add_row(vec![
        Cell::new("Confidence"),
        Cell::new(format!("{:.2}", result.confidence)),
    ]);
    table.add_row(vec![Cell::new("Type"), Cell::new(result.question_type)]);
    table.add_row(vec![
        Cell::new("Subject"),
        Cell::new(format!("{} ({})", result.subject, result.subject.local_name())),
    ]);
    table.add_row(vec![Cell::new("Difficulty"), Cell::new(result.difficulty)]);
    if !result.key_points.is_empty() {
        table.add_row(vec![
            Cell::new("Key points"),
            Cell::new(result.key_points.join("\n")),
        ]);
    }
    if !result.concepts.is_empty() {
        table.add_row(vec![
            Cell::new("Concepts"),
            Cell::new(result.concepts.join("\n")),
        ]);
    }
    if let Some(answer) = &result.suggested_answer {
        table.add_row(vec![Cell::new("Answer"), Cell::new(answer)]);
    }
    if let Some(explanation) = &result.explanation {
        table.add_row(vec![Cell::new("Explanation"), Cell::new(explanation)]);
    }
    output.push_str(&table.to_string());

    output
}

/// Format a resolved configuration as a table
pub fn format_config_table(config: &InvocationConfig, credential_count: usize) -> String {
    let mut output = String::new();

    let status_display = if config.is_valid() {
        "Valid".green()
    } else {
        "Invalid".red()
    };
    output.push_str(&format!("Configuration: {}\n", status_display));

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec![Cell::new("Endpoint"), Cell::new(config.endpoint())]);
    table.add_row(vec![Cell::new("Model"), Cell::new(config.model())]);
    table.add_row(vec![
        Cell::new("Timeout"),
        Cell::new(format!("{}s", config.timeout().as_secs())),
    ]);
    table.add_row(vec![Cell::new("Max retries"), Cell::new(config.max_retries())]);
    table.add_row(vec![Cell::new("Credentials"), Cell::new(credential_count)]);
    if let Some(primary) = config.primary_credential() {
        table.add_row(vec![Cell::new("Primary key"), Cell::new(primary.masked())]);
    }
    output.push_str(&table.to_string());

    for error in config.errors() {
        output.push_str(&format!("\n  {} {}", "✗".red(), error));
    }

    output
}
