//! Output formatting for the Regflow CLI
//!
//! Structured formats print the contract types as-is; the table format is a
//! colored, human-readable rendering of the same data.

use clap::ValueEnum;
use colored::Colorize;
use regflow_audit::{ChainVerification, StoredEvent};
use serde::Serialize;
use std::io::{self, Write};

use crate::contracts::{
    StatementStatus, StatementValidationResult, SupersededApproval, ValidationIssue,
};
use crate::error::ValidationError;

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table format with colors
    #[default]
    Table,
    /// JSON format for machine processing
    Json,
    /// YAML format
    Yaml,
}

/// Render a value as JSON or YAML
///
/// Returns `false` for [`OutputFormat::Table`], leaving table rendering to
/// the caller.
pub fn render_structured<T: Serialize>(
    value: &T,
    format: OutputFormat,
) -> Result<bool, ValidationError> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)
                .map_err(ValidationError::render)?;
            println!("{}", json);
            Ok(true)
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(value)
                .map_err(ValidationError::render)?;
            println!("{}", yaml);
            Ok(true)
        }
        OutputFormat::Table => Ok(false),
    }
}

/// Print an issue-list verdict (intake or packet)
pub fn print_issue_table(
    title: &str,
    subject: &str,
    passed: bool,
    issues: &[ValidationIssue],
    superseded: &[SupersededApproval],
) {
    let mut stdout = io::stdout();
    let blocking = issues.iter().filter(|i| i.blocking).count();
    let advisory = issues.len() - blocking;

    writeln!(stdout).ok();
    writeln!(stdout, "{}", title.cyan().bold()).ok();
    writeln!(stdout, "{}", "=".repeat(60)).ok();
    writeln!(stdout, "Subject: {}", subject).ok();
    writeln!(stdout).ok();

    let summary = if passed && issues.is_empty() {
        format!("{} passed", subject)
    } else if passed {
        format!("{} passed with {} advisory issue(s)", subject, advisory)
    } else {
        format!(
            "{} failed: {} blocking issue(s), {} advisory issue(s)",
            subject, blocking, advisory
        )
    };
    let icon = if passed { "+".green() } else { "x".red() };
    writeln!(stdout, "{} {}", icon, summary).ok();
    writeln!(stdout).ok();

    if !issues.is_empty() {
        writeln!(stdout, "{}", "Issues:".cyan().bold()).ok();
        writeln!(stdout, "{}", "-".repeat(60)).ok();
        for (index, issue) in issues.iter().enumerate() {
            let kind = if issue.blocking {
                "BLOCKING".red().bold()
            } else {
                "ADVISORY".yellow().bold()
            };
            writeln!(stdout, "{:>3}. [{}] {}", index + 1, kind, issue.code.bold()).ok();
            writeln!(stdout, "     {}", issue.message).ok();
        }
        writeln!(stdout).ok();
    }

    if !superseded.is_empty() {
        writeln!(stdout, "{}", "Superseded approvals:".cyan().bold()).ok();
        for entry in superseded {
            writeln!(
                stdout,
                "  {} {}: {} at {} superseded by {} at {}",
                "-".blue(),
                entry.signer_role,
                entry.superseded_decision,
                entry.superseded_at.to_rfc3339(),
                entry.effective_decision,
                entry.effective_at.to_rfc3339()
            )
            .ok();
        }
        writeln!(stdout).ok();
    }
}

/// Print statement validation results
pub fn print_statement_table(results: &[StatementValidationResult]) {
    let mut stdout = io::stdout();

    writeln!(stdout).ok();
    writeln!(stdout, "{}", "Evidence Statement Results".cyan().bold()).ok();
    writeln!(stdout, "{}", "=".repeat(60)).ok();

    for (index, result) in results.iter().enumerate() {
        let status = match result.status {
            StatementStatus::Validated => result.status.as_str().green(),
            StatementStatus::LowConfidence => result.status.as_str().yellow(),
            StatementStatus::MissingEvidence => result.status.as_str().red(),
        };
        let confidence = result
            .confidence
            .map(|c| c.as_str().to_string())
            .unwrap_or_else(|| "-".to_string());

        writeln!(stdout, "{:>3}. {}", index + 1, result.statement.bold()).ok();
        writeln!(stdout, "     status: {}  confidence: {}", status, confidence).ok();
        if let Some(reason) = &result.reason {
            writeln!(stdout, "     {}", reason.dimmed()).ok();
        }
    }
    writeln!(stdout).ok();
}

/// Print the audit event list
pub fn print_event_table(events: &[StoredEvent]) {
    let mut stdout = io::stdout();

    writeln!(stdout).ok();
    writeln!(stdout, "{}", "Audit Events".cyan().bold()).ok();
    writeln!(stdout, "{}", "=".repeat(60)).ok();

    if events.is_empty() {
        writeln!(stdout, "(ledger is empty)").ok();
    }
    for (index, event) in events.iter().enumerate() {
        writeln!(
            stdout,
            "{:>4}  {}  {}  {}",
            index,
            event.timestamp.to_rfc3339(),
            event.event_type.bold(),
            event.actor
        )
        .ok();
        writeln!(
            stdout,
            "      id={} hash={}",
            event.event_id,
            short_hash(&event.hash).dimmed()
        )
        .ok();
    }
    writeln!(stdout).ok();
}

/// Print a chain verification report
pub fn print_verification(report: &ChainVerification) {
    let mut stdout = io::stdout();
    if report.intact {
        writeln!(
            stdout,
            "{} Audit chain intact ({} event(s) checked)",
            "+".green(),
            report.events_checked
        )
        .ok();
    } else {
        writeln!(
            stdout,
            "{} Audit chain broken at index {}: {}",
            "x".red().bold(),
            report
                .first_broken_index
                .map(|i| i.to_string())
                .unwrap_or_else(|| "?".to_string()),
            report.reason.as_deref().unwrap_or("unknown")
        )
        .ok();
    }
}

/// Print a stored event after an append
pub fn print_appended(event: &StoredEvent) {
    println!(
        "{} Recorded {} as {} (hash {})",
        "+".green(),
        event.event_type.bold(),
        event.event_id,
        short_hash(&event.hash)
    );
}

fn short_hash(hash: &str) -> String {
    hash.chars().take(16).collect()
}
