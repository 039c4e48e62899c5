//! App Engine flexible versions, weighted by their configured resources.
//!
//! The version listing doesn't carry resource settings, so each flex version
//! is described individually. Standard-environment versions bill differently
//! and are ignored.

use super::{InventoryAdapter, as_items, number, text};
use crate::attribution::types::{
    AllocationMethod, EntitySize, InventoryEntity, Lifecycle, SkuHint,
};
use crate::cloud::InventorySource;
use crate::error::CollaboratorError;
use serde_json::Value;

const DEFAULT_CPU: f64 = 1.0;
const DEFAULT_MEMORY_GB: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default)]
pub struct DeployedVersionAdapter;

impl InventoryAdapter for DeployedVersionAdapter {
    fn method(&self) -> AllocationMethod {
        AllocationMethod::AppVersions
    }

    async fn list<I: InventorySource>(
        &self,
        inventory: &I,
    ) -> Result<Vec<InventoryEntity>, CollaboratorError> {
        let listing = inventory.query(&["app", "versions", "list"]).await?;

        let mut entities = Vec::new();
        for version in as_items(&listing).iter().filter(|v| is_flex(v)) {
            let id = text(version, "id");
            let service = text(version, "service");
            let service_flag = format!("--service={}", service);

            match inventory
                .query(&["app", "versions", "describe", id, service_flag.as_str()])
                .await
            {
                Ok(detail) => entities.push(parse_version(service, id, &detail)),
                Err(e) => log::warn!("Skipping App Engine version {}/{}: {}", service, id, e),
            }
        }
        Ok(entities)
    }

    fn weight_of(&self, entity: &InventoryEntity, hint: SkuHint) -> f64 {
        match (&entity.size, hint) {
            (EntitySize::Compute { vcpus, .. }, SkuHint::Cpu) => *vcpus,
            (EntitySize::Compute { memory_gb, .. }, SkuHint::Memory) => *memory_gb,
            _ => 0.0,
        }
    }
}

/// The environment is either `{"name": "FLEX"}` or a bare string.
fn is_flex(version: &Value) -> bool {
    let env = match version.get("environment") {
        Some(Value::Object(map)) => map.get("name").and_then(Value::as_str).unwrap_or(""),
        Some(Value::String(s)) => s.as_str(),
        _ => "",
    };
    env.eq_ignore_ascii_case("flex")
}

fn parse_version(service: &str, id: &str, detail: &Value) -> InventoryEntity {
    let resources = detail.get("resources");
    let vcpus = resources
        .and_then(|r| number(r, "cpu"))
        .unwrap_or(DEFAULT_CPU);
    let memory_gb = resources
        .and_then(|r| number(r, "memoryGb"))
        .unwrap_or(DEFAULT_MEMORY_GB);

    let serving = text(detail, "servingStatus");
    let state = if serving == "SERVING" {
        Lifecycle::Active
    } else {
        Lifecycle::Inactive(serving.to_string())
    };

    InventoryEntity {
        id: format!("{}/{}", service, id),
        detail: String::new(),
        size: EntitySize::Compute { vcpus, memory_gb },
        state,
        location: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::adapters::allocate_inventory;
    use crate::attribution::types::{AdapterOutcome, LineItem};
    use serde_json::json;
    use std::collections::HashMap;

    /// Answers by the joined argument list; unknown calls fail.
    struct Responses(HashMap<String, Value>);

    impl InventorySource for Responses {
        async fn query(&self, args: &[&str]) -> Result<Value, CollaboratorError> {
            let key = args.join(" ");
            self.0
                .get(&key)
                .cloned()
                .ok_or_else(|| CollaboratorError::CommandFailed {
                    command: format!("gcloud {}", key),
                    status: 1,
                    stderr: "NOT_FOUND".to_string(),
                })
        }
    }

    fn inventory() -> Responses {
        let mut map = HashMap::new();
        map.insert(
            "app versions list".to_string(),
            json!([
                {"id": "v1", "service": "default", "environment": {"name": "FLEX"}},
                {"id": "v2", "service": "api", "environment": "flex"},
                {"id": "v3", "service": "api", "environment": {"name": "STANDARD"}},
                {"id": "v4", "service": "worker", "environment": {"name": "FLEX"}},
                {"id": "v5", "service": "old", "environment": {"name": "FLEX"}}
            ]),
        );
        map.insert(
            "app versions describe v1 --service=default".to_string(),
            json!({"servingStatus": "SERVING", "resources": {"cpu": 2, "memoryGb": 4.0}}),
        );
        map.insert(
            "app versions describe v2 --service=api".to_string(),
            json!({"servingStatus": "SERVING"}),
        );
        map.insert(
            "app versions describe v5 --service=old".to_string(),
            json!({"servingStatus": "STOPPED", "resources": {"cpu": 8}}),
        );
        Responses(map)
    }

    #[test]
    fn test_is_flex() {
        assert!(is_flex(&json!({"environment": {"name": "FLEX"}})));
        assert!(is_flex(&json!({"environment": "flex"})));
        assert!(!is_flex(&json!({"environment": {"name": "STANDARD"}})));
        assert!(!is_flex(&json!({})));
    }

    #[test]
    fn test_defaults_when_resources_missing() {
        let entity = parse_version("api", "v2", &json!({"servingStatus": "SERVING"}));
        assert_eq!(entity.label(), "api/v2");
        assert_eq!(entity.size, EntitySize::Compute { vcpus: 1.0, memory_gb: 0.5 });
    }

    #[tokio::test]
    async fn test_list_skips_failed_describe_and_standard() {
        let entities = DeployedVersionAdapter.list(&inventory()).await.unwrap();
        let labels: Vec<String> = entities.iter().map(|e| e.label()).collect();
        assert_eq!(labels, vec!["default/v1", "api/v2", "old/v5"]);
    }

    #[tokio::test]
    async fn test_cpu_split_ignores_stopped_versions() {
        let item = LineItem {
            service: "App Engine".to_string(),
            sku: "Flex Instance Core Hours".to_string(),
            total_cost: 30.0,
            total_usage: 60.0,
            usage_unit: "hour".to_string(),
        };
        let outcome = allocate_inventory(&DeployedVersionAdapter, &inventory(), &item)
            .await
            .unwrap();
        let AdapterOutcome::Allocated(resources) = outcome else {
            panic!("expected allocation");
        };
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].label, "default/v1");
        assert_eq!(resources[0].cost, 20.0);
        assert_eq!(resources[1].label, "api/v2");
        assert_eq!(resources[1].cost, 10.0);
    }
}
