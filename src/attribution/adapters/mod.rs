//! Per-service usage adapters.
//!
//! Each supported service family has a strategy that turns live inventory or
//! metrics data into weights:
//!
//! | Service             | Strategy                  | Weight                            |
//! |---------------------|---------------------------|-----------------------------------|
//! | Cloud SQL           | fixed instance            | vCPUs or memory of runnable tiers |
//! | Compute Engine      | fixed instance / capacity | vCPUs or memory; disk size        |
//! | App Engine          | deployed version          | vCPUs or memory of serving flex   |
//! | Vertex AI           | endpoint                  | replicas x machine vCPUs or RAM   |
//! | Cloud Run           | time series               | billable instance time            |
//! | Cloud Run Functions | time series               | execution time, else count        |
//!
//! Everything else goes to the fallback estimator.

pub mod capacity;
pub mod deployed_version;
pub mod endpoint;
pub mod fixed_instance;
pub mod machine_types;
pub mod time_series;

pub use capacity::{CapacityAdapter, DiskClass};
pub use deployed_version::DeployedVersionAdapter;
pub use endpoint::EndpointAdapter;
pub use fixed_instance::{FixedInstanceAdapter, InstanceFamily};
pub use time_series::SeriesSource;

use super::allocator::{allocate, sort_by_cost_desc};
use super::types::{
    AdapterOutcome, AllocationMethod, InventoryEntity, LineItem, SkuHint,
};
use crate::cloud::InventorySource;
use crate::error::CollaboratorError;
use serde_json::Value;

// ============================================================================
// Service routing
// ============================================================================

/// Service families known to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    CloudSql,
    ComputeEngine,
    AppEngine,
    CloudRun,
    CloudRunFunctions,
    VertexAi,
    /// No adapter; always estimated from audit logs
    Unsupported,
}

impl ServiceKind {
    /// Resolve the billing export's service description.
    pub fn from_service(service: &str) -> Self {
        match service.trim() {
            "Cloud SQL" => Self::CloudSql,
            "Compute Engine" => Self::ComputeEngine,
            "App Engine" => Self::AppEngine,
            "Cloud Run" => Self::CloudRun,
            "Cloud Run Functions" | "Cloud Functions" => Self::CloudRunFunctions,
            "Vertex AI" => Self::VertexAi,
            _ => Self::Unsupported,
        }
    }
}

/// The allocation strategy chosen for a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    SqlInstances,
    ComputeInstances,
    ComputeDisks(DiskClass),
    AppVersions,
    ModelEndpoints,
    Series(SeriesSource),
    Fallback,
}

impl Strategy {
    /// Pick the strategy for a line item. Compute Engine disk SKUs are
    /// weighted by capacity rather than by machine size.
    pub fn select(item: &LineItem) -> Self {
        match ServiceKind::from_service(&item.service) {
            ServiceKind::CloudSql => Self::SqlInstances,
            ServiceKind::ComputeEngine => match DiskClass::from_sku(&item.sku) {
                Some(class) => Self::ComputeDisks(class),
                None => Self::ComputeInstances,
            },
            ServiceKind::AppEngine => Self::AppVersions,
            ServiceKind::CloudRun => Self::Series(SeriesSource::ContainerService),
            ServiceKind::CloudRunFunctions => Self::Series(SeriesSource::FunctionService),
            ServiceKind::VertexAi => Self::ModelEndpoints,
            ServiceKind::Unsupported => Self::Fallback,
        }
    }
}

// ============================================================================
// Inventory adapter contract
// ============================================================================

/// An adapter over a live resource inventory.
#[allow(async_fn_in_trait)]
pub trait InventoryAdapter {
    fn method(&self) -> AllocationMethod;

    /// List every entity, active or not.
    async fn list<I: InventorySource>(
        &self,
        inventory: &I,
    ) -> Result<Vec<InventoryEntity>, CollaboratorError>;

    /// Allocation key of an entity for a SKU billing `hint`.
    fn weight_of(&self, entity: &InventoryEntity, hint: SkuHint) -> f64;

    /// Weight that counts toward the pool: zero for inactive entities.
    fn pool_weight(&self, entity: &InventoryEntity, hint: SkuHint) -> f64 {
        if entity.state.is_active() {
            self.weight_of(entity, hint)
        } else {
            0.0
        }
    }
}

/// List, weigh and allocate a line item with an inventory adapter.
pub async fn allocate_inventory<A: InventoryAdapter, I: InventorySource>(
    adapter: &A,
    inventory: &I,
    item: &LineItem,
) -> Result<AdapterOutcome, CollaboratorError> {
    let entities = adapter.list(inventory).await?;
    let hint = item.sku_hint();

    let weighted: Vec<(String, f64)> = entities
        .iter()
        .map(|e| (e.label(), adapter.pool_weight(e, hint)))
        .collect();

    let excluded = weighted.iter().filter(|(_, w)| *w <= 0.0).count();
    log::debug!(
        "{}: {} entities listed, {} excluded from the pool",
        adapter.method(),
        entities.len(),
        excluded
    );

    let mut resources = allocate(item.total_cost, item.total_usage, &weighted);
    sort_by_cost_desc(&mut resources);
    Ok(AdapterOutcome::from_allocation(resources))
}

// ============================================================================
// JSON helpers for CLI payloads
// ============================================================================

/// The listing as an array; anything else lists nothing.
pub(crate) fn as_items(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or(&[])
}

/// String field, empty when absent.
pub(crate) fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Numeric field that may be encoded as a JSON number or a string.
pub(crate) fn number(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Last path segment of a resource URL such as a zone or machine type link.
pub(crate) fn last_segment(s: &str) -> &str {
    s.rsplit('/').next().unwrap_or(s)
}
