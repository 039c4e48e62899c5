//! Block storage weighted by provisioned capacity.

use super::{InventoryAdapter, as_items, last_segment, number, text};
use crate::attribution::types::{
    AllocationMethod, EntitySize, InventoryEntity, Lifecycle, SkuHint,
};
use crate::cloud::InventorySource;
use crate::error::CollaboratorError;
use serde_json::Value;

/// SKU fragments that identify a disk capacity charge.
const CAPACITY_SKU_MARKERS: &[&str] = &["PD Capacity", "Persistent Disk", "SSD backed"];

/// Disk class a capacity SKU bills for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskClass {
    Ssd,
    Balanced,
    Standard,
}

impl DiskClass {
    /// `None` when the SKU is not a disk capacity charge.
    pub fn from_sku(sku: &str) -> Option<Self> {
        if !CAPACITY_SKU_MARKERS.iter().any(|m| sku.contains(m)) {
            return None;
        }
        let lower = sku.to_lowercase();
        Some(if lower.contains("ssd") {
            Self::Ssd
        } else if lower.contains("balanced") {
            Self::Balanced
        } else {
            Self::Standard
        })
    }

    /// Whether a disk of `disk_type` (e.g. `pd-ssd`) is billed under this class.
    pub fn matches(&self, disk_type: &str) -> bool {
        match self {
            Self::Ssd => disk_type == "pd-balanced" || disk_type.contains("ssd"),
            Self::Balanced => disk_type == "pd-balanced",
            Self::Standard => disk_type == "pd-standard",
        }
    }
}

/// Weighs persistent disks of one class by `sizeGb`.
#[derive(Debug, Clone, Copy)]
pub struct CapacityAdapter {
    class: DiskClass,
}

impl CapacityAdapter {
    pub fn new(class: DiskClass) -> Self {
        Self { class }
    }
}

impl InventoryAdapter for CapacityAdapter {
    fn method(&self) -> AllocationMethod {
        AllocationMethod::ComputeDisks
    }

    /// Disks of other classes are dropped here, so they never get a row.
    async fn list<I: InventorySource>(
        &self,
        inventory: &I,
    ) -> Result<Vec<InventoryEntity>, CollaboratorError> {
        let listing = inventory.query(&["compute", "disks", "list"]).await?;
        Ok(as_items(&listing)
            .iter()
            .map(parse_disk)
            .filter(|disk| match &disk.size {
                EntitySize::Disk { disk_type, .. } => self.class.matches(disk_type),
                _ => false,
            })
            .collect())
    }

    fn weight_of(&self, entity: &InventoryEntity, _hint: SkuHint) -> f64 {
        match &entity.size {
            EntitySize::Disk { size_gb, .. } => *size_gb,
            _ => 0.0,
        }
    }
}

fn parse_disk(raw: &Value) -> InventoryEntity {
    let size_gb = number(raw, "sizeGb").unwrap_or(0.0);
    let disk_type = last_segment(text(raw, "type")).to_string();

    // Disks without a status are treated as attached and billed.
    let status = text(raw, "status");
    let state = if status.is_empty() || status == "READY" {
        Lifecycle::Active
    } else {
        Lifecycle::Inactive(status.to_string())
    };

    InventoryEntity {
        id: text(raw, "name").to_string(),
        detail: format!("{}GB {}", size_gb, disk_type),
        size: EntitySize::Disk { size_gb, disk_type },
        state,
        location: last_segment(text(raw, "zone")).to_string(),
    }
}
