//! Dependency change report generation
//!
//! Renders the output of a registry scan as JSON, a Markdown table, or a
//! plain-text summary for terminals.

use serde::Serialize;

use crate::change::{ChangeType, DependencyChange};
use crate::utils::truncate_string;

/// Longest version string shown in a table cell
const MAX_VERSION_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub total: usize,
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
}

impl ChangeSummary {
    pub fn from_changes(changes: &[DependencyChange]) -> Self {
        let mut summary = Self {
            total: changes.len(),
            ..Self::default()
        };
        for change in changes {
            match change.change_type() {
                ChangeType::Added => summary.added += 1,
                ChangeType::Removed => summary.removed += 1,
                ChangeType::Updated => summary.updated += 1,
            }
        }
        summary
    }
}

/// Output format for [`render`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Markdown,
    Summary,
}

pub fn render(format: ReportFormat, changes: &[DependencyChange]) -> serde_json::Result<String> {
    match format {
        ReportFormat::Json => generate_json_report(changes),
        ReportFormat::Markdown => Ok(generate_markdown_report(changes)),
        ReportFormat::Summary => Ok(generate_summary_report(changes)),
    }
}

/// Pretty-printed JSON array of change records
pub fn generate_json_report(changes: &[DependencyChange]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(changes)
}

pub fn generate_markdown_report(changes: &[DependencyChange]) -> String {
    let summary = ChangeSummary::from_changes(changes);
    let mut lines = vec![
        "# Dependency Changes".to_string(),
        String::new(),
        format!("**Date**: {}", chrono::Local::now().format("%Y-%m-%d")),
        String::new(),
        "## Summary".to_string(),
        "| Change | Count |".to_string(),
        "|--------|-------|".to_string(),
        format!("| + Added | {} |", summary.added),
        format!("| - Removed | {} |", summary.removed),
        format!("| ↑ Updated | {} |", summary.updated),
        format!("| **Total** | **{}** |", summary.total),
        String::new(),
    ];

    if changes.is_empty() {
        lines.push("## No dependency changes found".to_string());
        return lines.join("\n");
    }

    lines.push("## Changes".to_string());
    lines.push(String::new());
    lines.push("| Package | Change | From | To | File |".to_string());
    lines.push("|---------|--------|------|----|------|".to_string());

    for change in changes {
        lines.push(format!(
            "| {} | {} | {} | {} | {} |",
            escape_cell(change.name()),
            change.change_type(),
            version_cell(change.old_version()),
            version_cell(change.new_version()),
            escape_cell(change.source_file())
        ));
    }

    lines.join("\n")
}

pub fn generate_summary_report(changes: &[DependencyChange]) -> String {
    let summary = ChangeSummary::from_changes(changes);
    let mut lines = vec![
        "Dependency Changes".to_string(),
        String::new(),
        format!("  + Added:   {}", summary.added),
        format!("  - Removed: {}", summary.removed),
        format!("  ↑ Updated: {}", summary.updated),
        "  ─────────────".to_string(),
        format!("  Total:     {}", summary.total),
    ];

    if changes.is_empty() {
        lines.push(String::new());
        lines.push("[OK] No dependency changes found".to_string());
        return lines.join("\n");
    }

    lines.push(String::new());
    for change in changes {
        let detail = match (change.old_version(), change.new_version()) {
            (Some(old), Some(new)) => format!("{old} -> {new}"),
            (Some(old), None) => old.to_string(),
            (None, Some(new)) => new.to_string(),
            (None, None) => String::new(),
        };
        let sign = match change.change_type() {
            ChangeType::Added => '+',
            ChangeType::Removed => '-',
            ChangeType::Updated => '~',
        };
        lines.push(format!(
            "  {sign} {} {detail} ({})",
            change.name(),
            change.source_file()
        ));
    }

    lines.join("\n")
}

fn version_cell(version: Option<&str>) -> String {
    version.map_or_else(
        || "-".to_string(),
        |v| escape_cell(&truncate_string(v, MAX_VERSION_WIDTH)),
    )
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
