//! Sort, aggregate and write attribution results as CSV files.

use super::allocator::round2;
use super::types::{AttributionRow, CreatorSummaryRow, LineItem, PersonSummary};
use crate::error::Result;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;

pub const BREAKDOWN_FILE: &str = "resource_cost_breakdown.csv";
pub const PERSON_SUMMARY_FILE: &str = "person_cost_summary.csv";
pub const TOP_SKUS_FILE: &str = "top_10_cost_skus.csv";
pub const CREATOR_SUMMARY_FILE: &str = "gcp_sku_cost_creators_summary.csv";

// Header lines for reports with no rows; must match the serde names.
const BREAKDOWN_HEADERS: &[&str] = &[
    "Service",
    "SKU",
    "Total SKU Cost",
    "Unit Price",
    "Usage Unit",
    "Resource",
    "Resource Usage",
    "Usage Share %",
    "Actual Cost",
    "Created By",
    "Method",
];
const PERSON_SUMMARY_HEADERS: &[&str] = &["Person", "Total Cost"];
const TOP_SKUS_HEADERS: &[&str] = &[
    "Service",
    "SKU",
    "Total Cost",
    "Total Usage",
    "Usage Unit",
    "Unit Price",
];
const CREATOR_SUMMARY_HEADERS: &[&str] = &[
    "Service",
    "SKU",
    "Total Cost",
    "Creators (Count)",
    "Total Resources Created",
    "First Created",
    "Last Created",
];

/// A ranked line item as written to the top SKU table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopSkuRow {
    #[serde(rename = "Service")]
    pub service: String,
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Total Cost")]
    pub total_cost: f64,
    #[serde(rename = "Total Usage")]
    pub total_usage: f64,
    #[serde(rename = "Usage Unit")]
    pub usage_unit: String,
    #[serde(rename = "Unit Price")]
    pub unit_price: f64,
}

impl From<&LineItem> for TopSkuRow {
    fn from(item: &LineItem) -> Self {
        Self {
            service: item.service.clone(),
            sku: item.sku.clone(),
            total_cost: item.total_cost,
            total_usage: item.total_usage,
            usage_unit: item.usage_unit.clone(),
            unit_price: item.unit_price(),
        }
    }
}

/// Order rows by line item cost, then by allocated cost, highest first.
/// Stable, so rows of equal cost keep their attribution order.
pub fn sort_rows(rows: &mut [AttributionRow]) {
    rows.sort_by(|a, b| {
        desc(a.total_cost, b.total_cost).then_with(|| desc(a.actual_cost, b.actual_cost))
    });
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Total actual cost per creator, highest first.
pub fn summarize_by_person(rows: &[AttributionRow]) -> Vec<PersonSummary> {
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for row in rows {
        let total = totals.entry(row.created_by.as_str()).or_insert_with(|| {
            order.push(row.created_by.as_str());
            0.0
        });
        *total += row.actual_cost;
    }

    let mut summary: Vec<PersonSummary> = order
        .into_iter()
        .map(|identity| PersonSummary {
            identity: identity.to_string(),
            total_cost: round2(totals.get(identity).copied().unwrap_or(0.0)),
        })
        .collect();
    summary.sort_by(|a, b| desc(a.total_cost, b.total_cost));
    summary
}

/// Writes report files into one output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn write_breakdown(&self, rows: &[AttributionRow]) -> Result<PathBuf> {
        self.write(BREAKDOWN_FILE, BREAKDOWN_HEADERS, rows)
    }

    pub fn write_person_summary(&self, summary: &[PersonSummary]) -> Result<PathBuf> {
        self.write(PERSON_SUMMARY_FILE, PERSON_SUMMARY_HEADERS, summary)
    }

    pub fn write_top_skus(&self, items: &[LineItem]) -> Result<PathBuf> {
        let rows: Vec<TopSkuRow> = items.iter().map(TopSkuRow::from).collect();
        self.write(TOP_SKUS_FILE, TOP_SKUS_HEADERS, &rows)
    }

    pub fn write_creator_summary(&self, rows: &[CreatorSummaryRow]) -> Result<PathBuf> {
        self.write(CREATOR_SUMMARY_FILE, CREATOR_SUMMARY_HEADERS, rows)
    }

    /// Serialised rows carry their own header line; an empty report still
    /// gets `headers`.
    fn write<T: Serialize>(
        &self,
        file_name: &str,
        headers: &[&str],
        rows: &[T],
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);

        let mut writer = csv::Writer::from_path(&path)?;
        if rows.is_empty() {
            writer.write_record(headers)?;
        }
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        log::debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::types::AllocationMethod;
    use tempfile::TempDir;

    fn row(total: f64, actual: f64, creator: &str, resource: &str) -> AttributionRow {
        AttributionRow {
            service: "Compute Engine".to_string(),
            sku: format!("SKU {}", total),
            total_cost: total,
            unit_price: 1.0,
            usage_unit: "hour".to_string(),
            resource: resource.to_string(),
            resource_usage: actual,
            usage_share_pct: round2(actual / total * 100.0),
            actual_cost: actual,
            created_by: creator.to_string(),
            method: AllocationMethod::ComputeInstances,
        }
    }

    #[test]
    fn test_sort_rows() {
        let mut rows = vec![
            row(50.0, 10.0, "a", "r1"),
            row(100.0, 40.0, "b", "r2"),
            row(50.0, 40.0, "c", "r3"),
            row(100.0, 60.0, "d", "r4"),
            row(50.0, 40.0, "e", "r5"),
        ];
        sort_rows(&mut rows);
        let order: Vec<&str> = rows.iter().map(|r| r.resource.as_str()).collect();
        assert_eq!(order, vec!["r4", "r2", "r3", "r5", "r1"]);
    }

    #[test]
    fn test_summarize_by_person() {
        let rows = vec![
            row(100.0, 40.0, "alice@acme.io", "r1"),
            row(100.0, 60.0, "Unknown", "r2"),
            row(50.0, 25.01, "alice@acme.io", "r3"),
        ];
        let summary = summarize_by_person(&rows);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].identity, "alice@acme.io");
        assert_eq!(summary[0].total_cost, 65.01);
        assert_eq!(summary[1].identity, "Unknown");
        assert_eq!(summary[1].total_cost, 60.0);
    }

    #[test]
    fn test_write_breakdown_headers() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path());
        let path = writer
            .write_breakdown(&[row(100.0, 40.0, "alice@acme.io", "vm-1 (e2-standard-2)")])
            .unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Service,SKU,Total SKU Cost,Unit Price,Usage Unit,Resource,Resource Usage,Usage Share %,Actual Cost,Created By,Method"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Compute Engine,SKU 100,100.0,1.0,hour,vm-1 (e2-standard-2),40.0,40.0,40.0,alice@acme.io,gcloud compute instances list (exact)"
        );
    }

    #[test]
    fn test_write_into_missing_directory() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path().join("reports"));
        let summary = vec![PersonSummary {
            identity: "bob@acme.io".to_string(),
            total_cost: 12.5,
        }];
        let path = writer.write_person_summary(&summary).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content, "Person,Total Cost\nbob@acme.io,12.5\n");
    }

    fn header_line(path: PathBuf) -> String {
        let content = std::fs::read_to_string(path).unwrap();
        content.lines().next().unwrap_or_default().to_string()
    }

    #[test]
    fn test_empty_reports_keep_headers() {
        let full = TempDir::new().unwrap();
        let empty = TempDir::new().unwrap();
        let with_rows = ReportWriter::new(full.path());
        let without = ReportWriter::new(empty.path());

        let item = LineItem {
            service: "BigQuery".to_string(),
            sku: "Analysis".to_string(),
            total_cost: 9.0,
            total_usage: 3.0,
            usage_unit: "tebibyte".to_string(),
        };
        let creators = CreatorSummaryRow {
            service: "BigQuery".to_string(),
            sku: "Analysis".to_string(),
            total_cost: 9.0,
            creators: "None".to_string(),
            resources_created: 0,
            first_created: "N/A".to_string(),
            last_created: "N/A".to_string(),
        };
        let person = PersonSummary {
            identity: "Unknown".to_string(),
            total_cost: 9.0,
        };

        let pairs = [
            (
                with_rows.write_breakdown(&[row(9.0, 9.0, "Unknown", "No data")]).unwrap(),
                without.write_breakdown(&[]).unwrap(),
            ),
            (
                with_rows.write_person_summary(&[person]).unwrap(),
                without.write_person_summary(&[]).unwrap(),
            ),
            (
                with_rows.write_top_skus(&[item]).unwrap(),
                without.write_top_skus(&[]).unwrap(),
            ),
            (
                with_rows.write_creator_summary(&[creators]).unwrap(),
                without.write_creator_summary(&[]).unwrap(),
            ),
        ];
        for (populated, blank) in pairs {
            let expected = header_line(populated);
            assert!(!expected.is_empty());
            assert_eq!(std::fs::read_to_string(&blank).unwrap(), format!("{}\n", expected));
        }
    }
}
