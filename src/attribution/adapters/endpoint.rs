//! Vertex AI model endpoints, weighted by the machines serving them.

use super::machine_types::endpoint_shape;
use super::{InventoryAdapter, as_items, last_segment, number, text};
use crate::attribution::types::{
    AllocationMethod, Deployment, EntitySize, InventoryEntity, Lifecycle, SkuHint,
};
use crate::cloud::InventorySource;
use crate::error::CollaboratorError;
use serde_json::Value;

/// Lists endpoints across a fixed set of candidate regions.
#[derive(Debug, Clone)]
pub struct EndpointAdapter {
    regions: Vec<String>,
}

impl EndpointAdapter {
    pub fn new(regions: Vec<String>) -> Self {
        Self { regions }
    }
}

impl InventoryAdapter for EndpointAdapter {
    fn method(&self) -> AllocationMethod {
        AllocationMethod::ModelEndpoints
    }

    /// A region that fails to list is skipped; only when every region fails
    /// is the listing an error.
    async fn list<I: InventorySource>(
        &self,
        inventory: &I,
    ) -> Result<Vec<InventoryEntity>, CollaboratorError> {
        let mut entities = Vec::new();
        let mut last_error = None;
        let mut listed = 0usize;

        for region in &self.regions {
            let region_flag = format!("--region={}", region);
            match inventory.query(&["ai", "endpoints", "list", region_flag.as_str()]).await {
                Ok(listing) => {
                    listed += 1;
                    entities.extend(
                        as_items(&listing)
                            .iter()
                            .filter_map(|raw| parse_endpoint(raw, region)),
                    );
                }
                Err(e) => {
                    log::warn!("Could not list Vertex AI endpoints in {}: {}", region, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if listed == 0 => Err(e),
            _ => Ok(entities),
        }
    }

    fn weight_of(&self, entity: &InventoryEntity, hint: SkuHint) -> f64 {
        let EntitySize::Replicated { deployments } = &entity.size else {
            return 0.0;
        };
        deployments
            .iter()
            .map(|d| {
                let (vcpus, memory_gb) = endpoint_shape(&d.machine_type);
                let per_replica = match hint {
                    SkuHint::Cpu => vcpus,
                    SkuHint::Memory => memory_gb,
                };
                f64::from(d.replicas) * per_replica
            })
            .sum()
    }
}

/// Endpoints without deployed models are not billed and yield nothing.
fn parse_endpoint(raw: &Value, region: &str) -> Option<InventoryEntity> {
    let models = raw.get("deployedModels").and_then(Value::as_array)?;
    if models.is_empty() {
        return None;
    }

    let deployments: Vec<Deployment> = models.iter().map(parse_deployment).collect();
    let detail = deployments
        .iter()
        .map(|d| format!("{}x{}", d.machine_type, d.replicas))
        .collect::<Vec<_>>()
        .join(", ");

    let id = match text(raw, "displayName") {
        "" => last_segment(text(raw, "name")),
        name => name,
    };

    Some(InventoryEntity {
        id: id.to_string(),
        detail,
        size: EntitySize::Replicated { deployments },
        state: Lifecycle::Active,
        location: region.to_string(),
    })
}

fn parse_deployment(model: &Value) -> Deployment {
    let resources = model
        .get("dedicatedResources")
        .or_else(|| model.get("automaticResources"));

    let machine_type = model
        .pointer("/dedicatedResources/machineSpec/machineType")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let replicas = resources
        .and_then(|r| number(r, "minReplicaCount"))
        .filter(|n| *n >= 1.0)
        .map(|n| n as u32)
        .unwrap_or(1);

    Deployment {
        machine_type,
        replicas,
    }
}
