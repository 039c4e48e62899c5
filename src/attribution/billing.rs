//! Billing export loading.
//!
//! Reads the cost export CSV, normalises currency fields and ranks line items
//! by cost.

use super::types::LineItem;
use crate::error::{InputError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const SERVICE_COLUMN: &str = "Service description";
pub const SKU_COLUMN: &str = "SKU description";
pub const COST_COLUMN: &str = "Cost ($)";
pub const USAGE_COLUMN: &str = "Usage amount";
pub const USAGE_UNIT_COLUMN: &str = "Usage unit";

/// Accepted alternative header for the cost column.
const COST_COLUMN_ALT: &str = "Cost";

/// File name fragments of reports this tool writes; never picked as input.
const OUTPUT_FILE_PATTERNS: &[&str] = &["gcp_", "top_10", "resource_cost", "person_cost"];

/// How line items are formed from export rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ranking {
    /// Rank export rows directly
    #[default]
    Raw,
    /// Sum cost and usage per (service, SKU) before ranking
    Grouped,
}

/// Find the billing export in `dir`: the first CSV, by name, that is not one of
/// our own output files.
pub fn find_billing_export(dir: &Path) -> Result<PathBuf> {
    let pattern = dir.join("*.csv");
    let pattern = pattern.to_string_lossy();
    let mut candidates: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| InputError::Unreadable {
            file: dir.to_path_buf(),
            reason: e.to_string(),
        })?
        .filter_map(|entry| entry.ok())
        .filter(|path| !is_output_file(path))
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| InputError::NoBillingExport { dir: dir.to_path_buf() }.into())
}

fn is_output_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    OUTPUT_FILE_PATTERNS.iter().any(|p| name.contains(p))
}

/// Parse a currency or amount cell such as `"$1,234.56"`. Empty cells are 0.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Some(0.0);
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Load the top `top_k` line items from a billing export file.
pub fn load_line_items(path: &Path, ranking: Ranking, top_k: usize) -> Result<Vec<LineItem>> {
    let file = std::fs::File::open(path).map_err(|e| InputError::Unreadable {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let items = read_line_items(file, path)?;
    Ok(rank_line_items(items, ranking, top_k))
}

/// Parse every row of an export into a line item, in file order.
pub fn read_line_items<R: std::io::Read>(reader: R, source: &Path) -> Result<Vec<LineItem>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();

    let index_of = |name: &str| headers.iter().position(|h| h.trim() == name);
    let cost_idx = index_of(COST_COLUMN).or_else(|| index_of(COST_COLUMN_ALT));
    let columns = [
        (SERVICE_COLUMN, index_of(SERVICE_COLUMN)),
        (SKU_COLUMN, index_of(SKU_COLUMN)),
        (COST_COLUMN, cost_idx),
        (USAGE_COLUMN, index_of(USAGE_COLUMN)),
        (USAGE_UNIT_COLUMN, index_of(USAGE_UNIT_COLUMN)),
    ];

    let missing: Vec<String> = columns
        .iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(InputError::MissingColumns {
            file: source.to_path_buf(),
            missing,
        }
        .into());
    }

    let [service, sku, cost, usage, unit] = columns.map(|(_, idx)| idx.unwrap_or_default());

    let mut items = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1
        let row = i + 2;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();
        let amount = |idx: usize, column: &str| {
            let raw = record.get(idx).unwrap_or("");
            parse_amount(raw).ok_or_else(|| InputError::MalformedValue {
                row,
                column: column.to_string(),
                value: raw.to_string(),
            })
        };

        items.push(LineItem {
            service: field(service),
            sku: field(sku),
            total_cost: amount(cost, COST_COLUMN)?,
            total_usage: amount(usage, USAGE_COLUMN)?,
            usage_unit: field(unit),
        });
    }

    log::debug!("Read {} billing rows from {}", items.len(), source.display());
    Ok(items)
}

/// Rank line items by cost, highest first, keeping the first `top_k`.
///
/// Ties keep file order.
pub fn rank_line_items(items: Vec<LineItem>, ranking: Ranking, top_k: usize) -> Vec<LineItem> {
    let mut items = match ranking {
        Ranking::Raw => items,
        Ranking::Grouped => group_by_sku(items),
    };
    items.sort_by(|a, b| {
        b.total_cost
            .partial_cmp(&a.total_cost)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    items.truncate(top_k);
    items
}

fn group_by_sku(items: Vec<LineItem>) -> Vec<LineItem> {
    let mut grouped: Vec<LineItem> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for item in items {
        let key = (item.service.clone(), item.sku.clone());
        match index.get(&key) {
            Some(&i) => {
                grouped[i].total_cost += item.total_cost;
                grouped[i].total_usage += item.total_usage;
            }
            None => {
                index.insert(key, grouped.len());
                grouped.push(item);
            }
        }
    }

    grouped
}
