//! Fixed-size instances: Cloud SQL databases and Compute Engine VMs.

use super::machine_types::{compute_shape, sql_tier_shape};
use super::{InventoryAdapter, as_items, last_segment, text};
use crate::attribution::types::{
    AllocationMethod, EntitySize, InventoryEntity, Lifecycle, SkuHint,
};
use crate::cloud::InventorySource;
use crate::error::CollaboratorError;
use serde_json::Value;

/// Which instance inventory to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceFamily {
    CloudSql,
    ComputeEngine,
}

/// Weighs instances by vCPUs or memory depending on the SKU.
#[derive(Debug, Clone, Copy)]
pub struct FixedInstanceAdapter {
    family: InstanceFamily,
}

impl FixedInstanceAdapter {
    pub fn new(family: InstanceFamily) -> Self {
        Self { family }
    }

    fn list_args(&self) -> &'static [&'static str] {
        match self.family {
            InstanceFamily::CloudSql => &["sql", "instances", "list"],
            InstanceFamily::ComputeEngine => &["compute", "instances", "list"],
        }
    }

    fn parse(&self, raw: &Value) -> InventoryEntity {
        match self.family {
            InstanceFamily::CloudSql => parse_sql_instance(raw),
            InstanceFamily::ComputeEngine => parse_vm(raw),
        }
    }
}

impl InventoryAdapter for FixedInstanceAdapter {
    fn method(&self) -> AllocationMethod {
        match self.family {
            InstanceFamily::CloudSql => AllocationMethod::SqlInstances,
            InstanceFamily::ComputeEngine => AllocationMethod::ComputeInstances,
        }
    }

    async fn list<I: InventorySource>(
        &self,
        inventory: &I,
    ) -> Result<Vec<InventoryEntity>, CollaboratorError> {
        let listing = inventory.query(self.list_args()).await?;
        Ok(as_items(&listing).iter().map(|raw| self.parse(raw)).collect())
    }

    fn weight_of(&self, entity: &InventoryEntity, hint: SkuHint) -> f64 {
        match (&entity.size, hint) {
            (EntitySize::Compute { vcpus, .. }, SkuHint::Cpu) => *vcpus,
            (EntitySize::Compute { memory_gb, .. }, SkuHint::Memory) => *memory_gb,
            _ => 0.0,
        }
    }
}

/// A Cloud SQL instance bills only while runnable with an activation policy
/// other than `NEVER`.
fn parse_sql_instance(raw: &Value) -> InventoryEntity {
    let tier = pointer_text(raw, "/settings/tier");
    let (vcpus, memory_gb) = sql_tier_shape(tier);

    let state = text(raw, "state");
    let policy = pointer_text(raw, "/settings/activationPolicy");
    let lifecycle = if state == "RUNNABLE" && policy != "NEVER" {
        Lifecycle::Active
    } else if policy == "NEVER" {
        Lifecycle::Inactive(format!("{} (activation NEVER)", state))
    } else {
        Lifecycle::Inactive(state.to_string())
    };

    InventoryEntity {
        id: text(raw, "name").to_string(),
        detail: tier.to_string(),
        size: EntitySize::Compute { vcpus, memory_gb },
        state: lifecycle,
        location: text(raw, "region").to_string(),
    }
}

fn pointer_text<'a>(raw: &'a Value, pointer: &str) -> &'a str {
    raw.pointer(pointer).and_then(Value::as_str).unwrap_or("")
}

fn parse_vm(raw: &Value) -> InventoryEntity {
    let machine_type = last_segment(text(raw, "machineType"));
    let (vcpus, memory_gb) = compute_shape(machine_type);

    let status = text(raw, "status");
    let lifecycle = if status == "RUNNING" {
        Lifecycle::Active
    } else {
        Lifecycle::Inactive(status.to_string())
    };

    InventoryEntity {
        id: text(raw, "name").to_string(),
        detail: machine_type.to_string(),
        size: EntitySize::Compute { vcpus, memory_gb },
        state: lifecycle,
        location: last_segment(text(raw, "zone")).to_string(),
    }
}
