//! Console output for attribution results.
//!
//! Supports two output formats: a coloured table and JSON.

use super::types::{AttributionRow, CreatorSummaryRow, LineItem, PersonSummary, UNKNOWN_CREATOR};
use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const RULE: &str =
    "═══════════════════════════════════════════════════════════════════════════════════════════";

/// Widest a resource or SKU column gets before truncation.
const MAX_CELL: usize = 48;

// ============================================================================
// Output Format
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Coloured table (default)
    #[default]
    Table,
    Json,
}

/// Everything the breakdown command reports, as serialised to JSON.
#[derive(Debug, Serialize)]
struct BreakdownReport<'a> {
    rows: &'a [AttributionRow],
    people: &'a [PersonSummary],
    methods: BTreeMap<&'static str, usize>,
}

/// Number of rows produced by each allocation method.
pub fn method_counts(rows: &[AttributionRow]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for row in rows {
        *counts.entry(row.method.as_str()).or_insert(0) += 1;
    }
    counts
}

// ============================================================================
// Breakdown
// ============================================================================

pub fn format_breakdown(
    rows: &[AttributionRow],
    people: &[PersonSummary],
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Json => to_json(&BreakdownReport {
            rows,
            people,
            methods: method_counts(rows),
        }),
        OutputFormat::Table => breakdown_table(rows, people),
    }
}

fn breakdown_table(rows: &[AttributionRow], people: &[PersonSummary]) -> String {
    let mut output = String::new();
    output.push_str(&banner("💰 RESOURCE COST BREAKDOWN"));

    if rows.is_empty() {
        output.push_str(&format!("{}\n", "No line items were attributed.".yellow()));
        return output;
    }

    let mut current: Option<(&str, &str)> = None;
    for row in rows {
        if current != Some((row.service.as_str(), row.sku.as_str())) {
            current = Some((row.service.as_str(), row.sku.as_str()));
            output.push_str(&format!(
                "\n{} {} {}\n",
                row.service.bright_white().bold(),
                fit(&row.sku, MAX_CELL).cyan(),
                format!("${:.2}", row.total_cost).bright_yellow()
            ));
            output.push_str(&format!("  {} {}\n", "Method:".dimmed(), row.method));
        }

        output.push_str(&format!(
            "  {:<48} {:>7.2}% {:>12} {}\n",
            fit(&row.resource, MAX_CELL),
            row.usage_share_pct,
            format!("${:.2}", row.actual_cost).green(),
            creator(&row.created_by)
        ));
    }

    output.push_str(&format!("\n{}\n", "Cost by person".bright_white().bold()));
    for person in people {
        output.push_str(&format!(
            "  {:<48} {:>12}\n",
            creator(&person.identity),
            format!("${:.2}", person.total_cost).green()
        ));
    }

    output.push_str(&format!("\n{}\n", "Methods used".bright_white().bold()));
    for (method, count) in method_counts(rows) {
        output.push_str(&format!("  {:<48} {:>5}\n", method, count));
    }

    output.push_str(&format!("{}\n", RULE.bright_blue()));
    output
}

// ============================================================================
// Top SKUs
// ============================================================================

pub fn format_top_skus(items: &[LineItem], format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return to_json(&items);
    }

    let mut output = String::new();
    output.push_str(&banner("📊 TOP COST LINE ITEMS"));
    for (i, item) in items.iter().enumerate() {
        output.push_str(&format!(
            "{:>3}. {} {} {}\n     {} {:.2} {}   {} ${:.6}\n",
            i + 1,
            format!("${:.2}", item.total_cost).bright_yellow(),
            item.service.bright_white().bold(),
            fit(&item.sku, MAX_CELL).cyan(),
            "Usage:".dimmed(),
            item.total_usage,
            item.usage_unit,
            "Unit price:".dimmed(),
            item.unit_price()
        ));
    }
    output.push_str(&format!("{}\n", RULE.bright_blue()));
    output
}

// ============================================================================
// Creation activity
// ============================================================================

pub fn format_creator_summary(rows: &[CreatorSummaryRow], format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return to_json(&rows);
    }

    let mut output = String::new();
    output.push_str(&banner("👤 RESOURCE CREATORS BY LINE ITEM"));
    for row in rows {
        output.push_str(&format!(
            "{} {} {}\n  {} {}\n  {} {}   {} {} .. {}\n\n",
            row.service.bright_white().bold(),
            fit(&row.sku, MAX_CELL).cyan(),
            format!("${:.2}", row.total_cost).bright_yellow(),
            "Creators:".dimmed(),
            row.creators,
            "Created:".dimmed(),
            row.resources_created,
            "Window:".dimmed(),
            row.first_created,
            row.last_created
        ));
    }
    output.push_str(&format!("{}\n", RULE.bright_blue()));
    output
}

// ============================================================================
// Helpers
// ============================================================================

fn banner(title: &str) -> String {
    format!(
        "\n{}\n{}\n{}\n",
        RULE.bright_blue(),
        title.bright_white().bold(),
        RULE.bright_blue()
    )
}

fn creator(identity: &str) -> colored::ColoredString {
    if identity == UNKNOWN_CREATOR {
        identity.dimmed()
    } else {
        identity.normal()
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Truncate to `width` characters with a trailing ellipsis.
fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
