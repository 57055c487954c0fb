//! Output formatting helpers for CLI commands

use crate::client::BackendResponse;
use crate::health::{BackendHealth, HealthStatus};
use crate::routing::RoutingDecision;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

fn status_cell(status: HealthStatus) -> String {
    match status {
        HealthStatus::Healthy => "Healthy".green().to_string(),
        HealthStatus::Degraded => "Degraded".yellow().to_string(),
        HealthStatus::Unhealthy => "Unhealthy".red().to_string(),
        HealthStatus::Unknown => "Unknown".dimmed().to_string(),
    }
}

/// Format backend health as a table
pub fn format_health_table(backends: &[BackendHealth]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Backend", "Status", "Errors", "Latency", "Last Error"]);

    for b in backends {
        table.add_row(vec![
            Cell::new(&b.backend_id),
            Cell::new(status_cell(b.status)),
            Cell::new(b.consecutive_errors),
            Cell::new(format!("{}ms", b.latency.as_millis())),
            Cell::new(b.last_error.as_deref().unwrap_or("-")),
        ]);
    }

    table.to_string()
}

/// Format backend health as JSON
pub fn format_health_json(backends: &[BackendHealth]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({ "backends": backends }))
}

/// Format a routing decision, with the response when one was received
pub fn format_decision_pretty(
    decision: &RoutingDecision,
    response: Option<&BackendResponse>,
) -> String {
    let mut output = format!(
        "{} {} ({}, attempt {})\n  {}",
        "→".cyan(),
        decision.backend_id.bold(),
        decision.decision_type,
        decision.attempt_number,
        decision.reason.dimmed(),
    );
    if let Some(response) = response {
        output.push_str(&format!(
            "\n\n{}\n\n{} tokens",
            response.text, response.tokens_used
        ));
    }
    output
}

/// Format a routing decision as JSON
pub fn format_decision_json(
    decision: &RoutingDecision,
    response: Option<&BackendResponse>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "decision": decision,
        "response": response,
    }))
}
