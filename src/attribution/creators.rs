//! Resolve who created each attributed resource from audit-log entries.

use super::types::{CreationEvent, UNKNOWN_CREATOR};
use crate::cloud::{AuditLogSource, AuditQuery};
use crate::config::Config;
use std::collections::BTreeMap;

/// Name fragment matched against audit resource names: the last path segment
/// of the label's first whitespace-separated token.
///
/// `"web-1 (n2-standard-4, us-central1-a)"` -> `"web-1"`,
/// `"default/v1"` -> `"v1"`.
pub fn check_name(label: &str) -> &str {
    let first = label.split_whitespace().next().unwrap_or("");
    first.rsplit('/').next().unwrap_or(first)
}

/// Assign each label the actor of the first event whose resource name
/// contains the label's check name (case-insensitive). A label keeps its
/// first match. Labels without a match are `Unknown`.
pub fn match_creators(labels: &[String], events: &[CreationEvent]) -> BTreeMap<String, String> {
    let needles: Vec<(String, String)> = labels
        .iter()
        .map(|label| (label.clone(), check_name(label).to_lowercase()))
        .collect();

    let mut resolved: BTreeMap<String, String> = BTreeMap::new();
    for event in events {
        if resolved.len() == needles.len() {
            break;
        }
        let resource = event.resource_name.to_lowercase();
        for (label, needle) in &needles {
            if needle.is_empty() || resolved.contains_key(label) {
                continue;
            }
            if resource.contains(needle.as_str()) {
                resolved.insert(label.clone(), event.actor.clone());
            }
        }
    }

    for label in labels {
        resolved
            .entry(label.clone())
            .or_insert_with(|| UNKNOWN_CREATOR.to_string());
    }
    resolved
}

/// Look up creators for the labels of one service. Never fails: an unmapped
/// service or a failed audit query resolves everything to `Unknown`.
pub async fn resolve_creators<L: AuditLogSource>(
    audit: &L,
    config: &Config,
    project: &str,
    service: &str,
    labels: &[String],
) -> BTreeMap<String, String> {
    let events = match config.api_service(service) {
        Some(api) => {
            let query = AuditQuery::creations(project, api, config.lookback_days);
            match audit.creation_events(&query).await {
                Ok(events) => events,
                Err(e) => {
                    log::warn!("Audit log query for {} failed: {}", service, e);
                    Vec::new()
                }
            }
        }
        None => {
            log::warn!("No audit service mapping for {}; creators unknown", service);
            Vec::new()
        }
    };

    log::debug!(
        "Matching {} labels against {} creation events for {}",
        labels.len(),
        events.len(),
        service
    );
    match_creators(labels, &events)
}
