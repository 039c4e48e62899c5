//! Core types for cost attribution.
//!
//! A billing [`LineItem`] is split across [`WeightedResource`]s, enriched with a
//! creator and flattened into [`AttributionRow`]s, the atomic output unit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Creator recorded when no audit entry matches a resource.
pub const UNKNOWN_CREATOR: &str = "Unknown";

// ============================================================================
// Line items
// ============================================================================

/// One ranked (service, SKU) cost record from the billing export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub service: String,
    pub sku: String,
    pub total_cost: f64,
    pub total_usage: f64,
    pub usage_unit: String,
}

impl LineItem {
    /// Cost per usage unit, 0 when nothing was used.
    pub fn unit_price(&self) -> f64 {
        if self.total_usage > 0.0 {
            self.total_cost / self.total_usage
        } else {
            0.0
        }
    }

    pub fn sku_hint(&self) -> SkuHint {
        SkuHint::from_sku(&self.sku)
    }
}

/// Which capacity dimension a SKU bills for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkuHint {
    Cpu,
    Memory,
}

impl SkuHint {
    pub fn from_sku(sku: &str) -> Self {
        let sku = sku.to_lowercase();
        if sku.contains("cpu") || sku.contains("core") {
            Self::Cpu
        } else {
            Self::Memory
        }
    }
}

// ============================================================================
// Inventory
// ============================================================================

/// Lifecycle state of an inventory entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Running or serving; contributes weight
    Active,
    /// Stopped, terminated or otherwise not billed; keeps the raw state
    Inactive(String),
}

impl Lifecycle {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// One model deployment on an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub machine_type: String,
    pub replicas: u32,
}

/// Category-specific size attribute of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntitySize {
    /// Instances and app versions
    Compute { vcpus: f64, memory_gb: f64 },
    /// Block storage
    Disk { size_gb: f64, disk_type: String },
    /// Model endpoints
    Replicated { deployments: Vec<Deployment> },
}

/// A resource reported by the live inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntity {
    pub id: String,
    /// Human-readable detail shown next to the id (machine type, size, ...)
    pub detail: String,
    pub size: EntitySize,
    pub state: Lifecycle,
    pub location: String,
}

impl InventoryEntity {
    /// Label used in reports and for creator matching; the id comes first.
    pub fn label(&self) -> String {
        match (self.detail.is_empty(), self.location.is_empty()) {
            (true, true) => self.id.clone(),
            (true, false) => format!("{} ({})", self.id, self.location),
            (false, true) => format!("{} ({})", self.id, self.detail),
            (false, false) => format!("{} ({}, {})", self.id, self.detail, self.location),
        }
    }
}

// ============================================================================
// Allocation results
// ============================================================================

/// A resource with its allocation key and computed shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedResource {
    pub label: String,
    pub weight: f64,
    /// Percentage of the pool, rounded to 2 decimals
    pub usage_share_pct: f64,
    /// Share of the line item's usage, rounded to 2 decimals
    pub usage: f64,
    /// Share of the line item's cost, rounded to cents
    pub cost: f64,
}

/// Outcome of running an adapter for one line item.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterOutcome {
    Allocated(Vec<WeightedResource>),
    /// Nothing to weigh; the dispatcher falls back
    NoData,
}

impl AdapterOutcome {
    pub fn from_allocation(resources: Vec<WeightedResource>) -> Self {
        if resources.is_empty() {
            Self::NoData
        } else {
            Self::Allocated(resources)
        }
    }
}

/// How a row's cost was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AllocationMethod {
    SqlInstances,
    ComputeInstances,
    ComputeDisks,
    AppVersions,
    ModelEndpoints,
    BillableInstanceTime,
    FunctionExecutionTimes,
    FunctionExecutionCount,
    ProportionalEstimate,
    NoData,
}

impl AllocationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlInstances => "gcloud sql instances list (exact)",
            Self::ComputeInstances => "gcloud compute instances list (exact)",
            Self::ComputeDisks => "gcloud compute disks list (exact)",
            Self::AppVersions => "gcloud app versions describe (exact)",
            Self::ModelEndpoints => "gcloud ai endpoints list (machine type x replicas)",
            Self::BillableInstanceTime => "Cloud Monitoring: billable_instance_time",
            Self::FunctionExecutionTimes => "Cloud Monitoring: execution_times",
            Self::FunctionExecutionCount => "Cloud Monitoring: execution_count",
            Self::ProportionalEstimate => "Proportional Estimate (fallback)",
            Self::NoData => "No data",
        }
    }
}

impl fmt::Display for AllocationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AllocationMethod {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ============================================================================
// Audit
// ============================================================================

/// A resource creation entry read from the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationEvent {
    pub resource_name: String,
    pub actor: String,
    pub timestamp: String,
    pub method: String,
}

// ============================================================================
// Report rows
// ============================================================================

/// One (line item x resource) attribution, the atomic output unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributionRow {
    #[serde(rename = "Service")]
    pub service: String,
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Total SKU Cost")]
    pub total_cost: f64,
    #[serde(rename = "Unit Price")]
    pub unit_price: f64,
    #[serde(rename = "Usage Unit")]
    pub usage_unit: String,
    #[serde(rename = "Resource")]
    pub resource: String,
    #[serde(rename = "Resource Usage")]
    pub resource_usage: f64,
    #[serde(rename = "Usage Share %")]
    pub usage_share_pct: f64,
    #[serde(rename = "Actual Cost")]
    pub actual_cost: f64,
    #[serde(rename = "Created By")]
    pub created_by: String,
    #[serde(rename = "Method")]
    pub method: AllocationMethod,
}

impl AttributionRow {
    pub fn new(
        item: &LineItem,
        resource: &WeightedResource,
        created_by: impl Into<String>,
        method: AllocationMethod,
    ) -> Self {
        Self {
            service: item.service.clone(),
            sku: item.sku.clone(),
            total_cost: item.total_cost,
            unit_price: item.unit_price(),
            usage_unit: item.usage_unit.clone(),
            resource: resource.label.clone(),
            resource_usage: resource.usage,
            usage_share_pct: resource.usage_share_pct,
            actual_cost: resource.cost,
            created_by: created_by.into(),
            method,
        }
    }

    /// The whole line item, unattributed.
    pub fn unattributed(item: &LineItem) -> Self {
        Self {
            service: item.service.clone(),
            sku: item.sku.clone(),
            total_cost: item.total_cost,
            unit_price: item.unit_price(),
            usage_unit: item.usage_unit.clone(),
            resource: "No data".to_string(),
            resource_usage: item.total_usage,
            usage_share_pct: 100.0,
            actual_cost: item.total_cost,
            created_by: UNKNOWN_CREATOR.to_string(),
            method: AllocationMethod::NoData,
        }
    }
}

/// Summed actual cost per creator identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSummary {
    #[serde(rename = "Person")]
    pub identity: String,
    #[serde(rename = "Total Cost")]
    pub total_cost: f64,
}

/// Per line item summary of who created resources in its service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorSummaryRow {
    #[serde(rename = "Service")]
    pub service: String,
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Total Cost")]
    pub total_cost: f64,
    #[serde(rename = "Creators (Count)")]
    pub creators: String,
    #[serde(rename = "Total Resources Created")]
    pub resources_created: usize,
    #[serde(rename = "First Created")]
    pub first_created: String,
    #[serde(rename = "Last Created")]
    pub last_created: String,
}
