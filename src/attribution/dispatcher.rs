//! Route each line item to its adapter or to the fallback estimator.

use super::adapters::{
    CapacityAdapter, DeployedVersionAdapter, EndpointAdapter, FixedInstanceAdapter,
    InstanceFamily, InventoryAdapter, Strategy, allocate_inventory,
};
use super::creators::resolve_creators;
use super::fallback;
use super::types::{AdapterOutcome, AllocationMethod, AttributionRow, LineItem, UNKNOWN_CREATOR};
use crate::cloud::{AuditLogSource, InventorySource, MetricsSource};
use crate::config::Config;
use crate::error::CollaboratorError;
use std::time::Duration;

/// Attribution pipeline over a set of collaborators.
pub struct Dispatcher<'a, I, M, L> {
    config: &'a Config,
    project: &'a str,
    inventory: &'a I,
    metrics: &'a M,
    audit: &'a L,
}

impl<'a, I, M, L> Dispatcher<'a, I, M, L>
where
    I: InventorySource,
    M: MetricsSource,
    L: AuditLogSource,
{
    pub fn new(
        config: &'a Config,
        project: &'a str,
        inventory: &'a I,
        metrics: &'a M,
        audit: &'a L,
    ) -> Self {
        Self {
            config,
            project,
            inventory,
            metrics,
            audit,
        }
    }

    /// Attribute every item, one at a time, pausing between items.
    /// `progress` is called with the index of each item before it runs.
    pub async fn attribute_all(
        &self,
        items: &[LineItem],
        mut progress: impl FnMut(usize, &LineItem),
    ) -> Vec<AttributionRow> {
        let delay = Duration::from_millis(self.config.request_delay_ms);
        let mut rows = Vec::new();

        for (i, item) in items.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            progress(i, item);
            rows.extend(self.attribute(item).await);
        }
        rows
    }

    /// Rows for one line item. Never fails: adapter errors and empty pools
    /// degrade to the fallback estimate.
    pub async fn attribute(&self, item: &LineItem) -> Vec<AttributionRow> {
        let strategy = Strategy::select(item);
        if strategy == Strategy::Fallback {
            log::info!("{} has no usage adapter; estimating from audit logs", item.service);
            return fallback::estimate(self.audit, self.config, self.project, item).await;
        }

        match self.run(strategy, item).await {
            Ok((method, AdapterOutcome::Allocated(resources))) => {
                let labels: Vec<String> = resources.iter().map(|r| r.label.clone()).collect();
                let creators = resolve_creators(
                    self.audit,
                    self.config,
                    self.project,
                    &item.service,
                    &labels,
                )
                .await;

                resources
                    .iter()
                    .map(|resource| {
                        let created_by = creators
                            .get(&resource.label)
                            .cloned()
                            .unwrap_or_else(|| UNKNOWN_CREATOR.to_string());
                        AttributionRow::new(item, resource, created_by, method)
                    })
                    .collect()
            }
            Ok((method, AdapterOutcome::NoData)) => {
                log::info!("{} found nothing to weigh for {}; falling back", method, item.sku);
                fallback::estimate(self.audit, self.config, self.project, item).await
            }
            Err(e) => {
                log::warn!("Usage lookup for {} / {} failed: {}", item.service, item.sku, e);
                fallback::estimate(self.audit, self.config, self.project, item).await
            }
        }
    }

    async fn run(
        &self,
        strategy: Strategy,
        item: &LineItem,
    ) -> Result<(AllocationMethod, AdapterOutcome), CollaboratorError> {
        match strategy {
            Strategy::SqlInstances => {
                self.inventory_split(FixedInstanceAdapter::new(InstanceFamily::CloudSql), item)
                    .await
            }
            Strategy::ComputeInstances => {
                self.inventory_split(FixedInstanceAdapter::new(InstanceFamily::ComputeEngine), item)
                    .await
            }
            Strategy::ComputeDisks(class) => {
                self.inventory_split(CapacityAdapter::new(class), item).await
            }
            Strategy::AppVersions => self.inventory_split(DeployedVersionAdapter, item).await,
            Strategy::ModelEndpoints => {
                let adapter = EndpointAdapter::new(self.config.endpoint_regions.clone());
                self.inventory_split(adapter, item).await
            }
            Strategy::Series(source) => {
                source
                    .allocate(self.metrics, item, self.config.lookback_days)
                    .await
            }
            Strategy::Fallback => Ok((AllocationMethod::ProportionalEstimate, AdapterOutcome::NoData)),
        }
    }

    async fn inventory_split<A: InventoryAdapter>(
        &self,
        adapter: A,
        item: &LineItem,
    ) -> Result<(AllocationMethod, AdapterOutcome), CollaboratorError> {
        let outcome = allocate_inventory(&adapter, self.inventory, item).await?;
        Ok((adapter.method(), outcome))
    }
}
