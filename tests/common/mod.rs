//! Fixture collaborators shared by the integration tests.
#![allow(dead_code)]

use cost_attribution::attribution::{CreationEvent, LineItem};
use cost_attribution::cloud::{
    AuditLogSource, AuditQuery, InventorySource, MetricQuery, MetricsSource,
};
use cost_attribution::error::CollaboratorError;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

pub fn line_item(service: &str, sku: &str, cost: f64, usage: f64) -> LineItem {
    LineItem {
        service: service.to_string(),
        sku: sku.to_string(),
        total_cost: cost,
        total_usage: usage,
        usage_unit: "hour".to_string(),
    }
}

pub fn event(resource: &str, actor: &str, timestamp: &str) -> CreationEvent {
    CreationEvent {
        resource_name: resource.to_string(),
        actor: actor.to_string(),
        timestamp: timestamp.to_string(),
        method: "v1.compute.instances.insert".to_string(),
    }
}

/// Inventory answering by the joined argument list. Unknown listings fail
/// like a CLI permission error.
#[derive(Default)]
pub struct FixtureInventory {
    listings: HashMap<String, Value>,
    pub calls: RefCell<Vec<String>>,
}

impl FixtureInventory {
    pub fn with(mut self, args: &str, listing: Value) -> Self {
        self.listings.insert(args.to_string(), listing);
        self
    }
}

impl InventorySource for FixtureInventory {
    async fn query(&self, args: &[&str]) -> Result<Value, CollaboratorError> {
        let key = args.join(" ");
        self.calls.borrow_mut().push(key.clone());
        self.listings
            .get(&key)
            .cloned()
            .ok_or(CollaboratorError::CommandFailed {
                command: format!("gcloud {}", key),
                status: 1,
                stderr: "PERMISSION_DENIED".to_string(),
            })
    }
}

/// Metrics keyed by metric type.
#[derive(Default)]
pub struct FixtureMetrics {
    totals: HashMap<&'static str, BTreeMap<String, f64>>,
}

impl FixtureMetrics {
    pub fn with(mut self, metric_type: &'static str, values: &[(&str, f64)]) -> Self {
        self.totals.insert(
            metric_type,
            values.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        );
        self
    }
}

impl MetricsSource for FixtureMetrics {
    async fn sum_by_label(
        &self,
        query: &MetricQuery,
    ) -> Result<BTreeMap<String, f64>, CollaboratorError> {
        Ok(self.totals.get(query.metric_type).cloned().unwrap_or_default())
    }
}

/// Audit events keyed by API service name; counts every query.
#[derive(Default)]
pub struct FixtureAudit {
    events: HashMap<String, Vec<CreationEvent>>,
    failing: bool,
    pub calls: Cell<usize>,
}

impl FixtureAudit {
    pub fn with(mut self, service_api: &str, events: Vec<CreationEvent>) -> Self {
        self.events.insert(service_api.to_string(), events);
        self
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }
}

impl AuditLogSource for FixtureAudit {
    async fn creation_events(
        &self,
        query: &AuditQuery,
    ) -> Result<Vec<CreationEvent>, CollaboratorError> {
        self.calls.set(self.calls.get() + 1);
        if self.failing {
            return Err(CollaboratorError::Api {
                api: "Cloud Logging",
                status: 403,
                body: "denied".to_string(),
            });
        }
        Ok(self.events.get(&query.service_api).cloned().unwrap_or_default())
    }
}
