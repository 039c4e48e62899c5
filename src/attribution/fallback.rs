//! Proportional estimate for line items no adapter could attribute.
//!
//! Splits the cost by how many resources each identity created in the
//! service during the lookback window.

use super::allocator::{allocate, sort_by_cost_desc};
use super::types::{AllocationMethod, AttributionRow, CreationEvent, LineItem};
use crate::cloud::{AuditLogSource, AuditQuery};
use crate::config::Config;
use std::collections::BTreeMap;

/// Estimate rows for `item`. Always yields at least one row.
pub async fn estimate<L: AuditLogSource>(
    audit: &L,
    config: &Config,
    project: &str,
    item: &LineItem,
) -> Vec<AttributionRow> {
    let Some(api) = config.api_service(&item.service) else {
        log::warn!(
            "No audit service mapping for {}; leaving {} unattributed",
            item.service,
            item.sku
        );
        return vec![AttributionRow::unattributed(item)];
    };

    let query = AuditQuery::creations(project, api, config.lookback_days);
    match audit.creation_events(&query).await {
        Ok(events) => split_by_actor(item, &events),
        Err(e) => {
            log::warn!("Audit log query for {} failed: {}", item.service, e);
            vec![AttributionRow::unattributed(item)]
        }
    }
}

/// Share = the actor's event count over all events.
pub fn split_by_actor(item: &LineItem, events: &[CreationEvent]) -> Vec<AttributionRow> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for event in events {
        *counts.entry(event.actor.as_str()).or_insert(0) += 1;
    }

    let weighted: Vec<(String, f64)> = counts
        .iter()
        .map(|(actor, count)| (actor.to_string(), *count as f64))
        .collect();
    let mut resources = allocate(item.total_cost, item.total_usage, &weighted);
    if resources.is_empty() {
        return vec![AttributionRow::unattributed(item)];
    }
    sort_by_cost_desc(&mut resources);

    resources
        .into_iter()
        .map(|resource| {
            let actor = resource.label.clone();
            let count = counts.get(actor.as_str()).copied().unwrap_or(0);
            let mut row = AttributionRow::new(
                item,
                &resource,
                actor,
                AllocationMethod::ProportionalEstimate,
            );
            row.resource = format!("{} resources created", count);
            row
        })
        .collect()
}
