//! Cloud Logging client for audit-log searches.

use super::{AuditLogSource, AuditQuery};
use crate::attribution::types::{CreationEvent, UNKNOWN_CREATOR};
use crate::error::CollaboratorError;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const LOGGING_API: &str = "https://logging.googleapis.com/v2";
const PAGE_SIZE: usize = 200;
/// Oldest first: the first matching entry per resource is its creator, and
/// the entry cap drops the newest entries.
const ORDER_BY: &str = "timestamp asc";
const UNKNOWN: &str = "Unknown";

/// Cloud Logging REST client.
pub struct LoggingClient {
    base_url: String,
    http_client: Client,
    token: Option<String>,
    max_entries: usize,
}

impl LoggingClient {
    pub fn new(token: Option<String>, max_entries: usize) -> Result<Self, CollaboratorError> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: LOGGING_API.to_string(),
            http_client,
            token,
            max_entries,
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl AuditLogSource for LoggingClient {
    async fn creation_events(
        &self,
        query: &AuditQuery,
    ) -> Result<Vec<CreationEvent>, CollaboratorError> {
        let token = self
            .token
            .as_deref()
            .ok_or(CollaboratorError::MissingCredentials("Cloud Logging"))?;

        let url = format!("{}/entries:list", self.base_url);
        let filter = query.to_filter();
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        log::debug!("Audit log filter: {}", filter);

        loop {
            let request = ListEntriesRequest {
                resource_names: vec![format!("projects/{}", query.project)],
                filter: &filter,
                order_by: ORDER_BY,
                page_size: PAGE_SIZE.min(self.max_entries.max(1)),
                page_token: page_token.as_deref(),
            };

            let response = self
                .http_client
                .post(&url)
                .bearer_auth(token)
                .json(&request)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(CollaboratorError::Api {
                    api: "Cloud Logging",
                    status: response.status().as_u16(),
                    body: response.text().await.unwrap_or_default(),
                });
            }

            let page: ListEntriesResponse = response.json().await?;
            events.extend(page.entries.into_iter().filter_map(LogEntry::into_event));

            if events.len() >= self.max_entries {
                log::debug!(
                    "Stopping audit log scan for {} at {} entries",
                    query.service_api,
                    self.max_entries
                );
                events.truncate(self.max_entries);
                break;
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(events)
    }
}

// ============================================================================
// Cloud Logging API types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListEntriesRequest<'a> {
    resource_names: Vec<String>,
    filter: &'a str,
    order_by: &'a str,
    page_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEntriesResponse {
    #[serde(default)]
    entries: Vec<LogEntry>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogEntry {
    #[serde(default)]
    timestamp: String,
    proto_payload: Option<AuditPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuditPayload {
    resource_name: Option<String>,
    method_name: Option<String>,
    authentication_info: Option<AuthenticationInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticationInfo {
    principal_email: Option<String>,
}

impl LogEntry {
    /// Entries without an audit payload are skipped.
    fn into_event(self) -> Option<CreationEvent> {
        let payload = self.proto_payload?;
        Some(CreationEvent {
            resource_name: payload.resource_name.unwrap_or_else(|| UNKNOWN.to_string()),
            actor: payload
                .authentication_info
                .and_then(|a| a.principal_email)
                .unwrap_or_else(|| UNKNOWN_CREATOR.to_string()),
            timestamp: self.timestamp,
            method: payload.method_name.unwrap_or_else(|| UNKNOWN.to_string()),
        })
    }
}
