//! Who created resources in the services behind the top line items.

use super::types::{CreationEvent, CreatorSummaryRow, LineItem};
use crate::cloud::{AuditLogSource, AuditQuery};
use crate::config::Config;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Summarise creation activity for each line item. Services are queried once
/// each, with the configured request delay between queries; an unmapped
/// service or failed query summarises as no activity.
pub async fn summarize_creations<L: AuditLogSource>(
    audit: &L,
    config: &Config,
    project: &str,
    items: &[LineItem],
) -> Vec<CreatorSummaryRow> {
    let delay = Duration::from_millis(config.request_delay_ms);
    let mut by_service: HashMap<String, Vec<CreationEvent>> = HashMap::new();
    let mut rows = Vec::with_capacity(items.len());

    for item in items {
        if !by_service.contains_key(&item.service) {
            if !by_service.is_empty() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let events = service_activity(audit, config, project, &item.service).await;
            by_service.insert(item.service.clone(), events);
        }
        let events = by_service
            .get(&item.service)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        rows.push(summary_row(item, events));
    }
    rows
}

async fn service_activity<L: AuditLogSource>(
    audit: &L,
    config: &Config,
    project: &str,
    service: &str,
) -> Vec<CreationEvent> {
    let Some(api) = config.api_service(service) else {
        log::warn!("No audit service mapping for {}", service);
        return Vec::new();
    };

    let query = AuditQuery::activity(project, api, config.lookback_days);
    match audit.creation_events(&query).await {
        Ok(events) => events,
        Err(e) => {
            log::warn!("Audit log query for {} failed: {}", service, e);
            Vec::new()
        }
    }
}

/// `creator(count)` list ordered by count, then the first and last
/// timestamps of the window.
pub fn summary_row(item: &LineItem, events: &[CreationEvent]) -> CreatorSummaryRow {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for event in events {
        *counts.entry(event.actor.as_str()).or_insert(0) += 1;
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let creators = if ranked.is_empty() {
        "None".to_string()
    } else {
        ranked
            .iter()
            .map(|(actor, n)| format!("{}({})", actor, n))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let timestamps = events.iter().map(|e| e.timestamp.as_str()).filter(|t| !t.is_empty());
    let first = timestamps.clone().min().unwrap_or("N/A");
    let last = timestamps.max().unwrap_or("N/A");

    CreatorSummaryRow {
        service: item.service.clone(),
        sku: item.sku.clone(),
        total_cost: item.total_cost,
        creators,
        resources_created: events.len(),
        first_created: first.to_string(),
        last_created: last.to_string(),
    }
}
