//! External collaborators: the inventory CLI, the metrics backend and the
//! audit log.
//!
//! Each collaborator is a trait so the attribution pipeline can run against
//! fixture data. The live implementations talk to Google Cloud:
//!
//! - [`GcloudCli`] shells out to `gcloud ... --format=json`
//! - [`MonitoringClient`] calls the Cloud Monitoring v3 REST API
//! - [`LoggingClient`] calls the Cloud Logging v2 REST API

pub mod gcloud_cli;
pub mod logging_client;
pub mod monitoring_client;

pub use gcloud_cli::GcloudCli;
pub use logging_client::LoggingClient;
pub use monitoring_client::MonitoringClient;

use crate::attribution::types::CreationEvent;
use crate::error::CollaboratorError;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::collections::BTreeMap;

// ============================================================================
// Collaborator traits
// ============================================================================

/// A live resource inventory queried with CLI-style arguments.
#[allow(async_fn_in_trait)]
pub trait InventorySource {
    /// Run a project-scoped listing (e.g. `["sql", "instances", "list"]`) and
    /// return the parsed JSON.
    async fn query(&self, args: &[&str]) -> Result<serde_json::Value, CollaboratorError>;
}

/// A time-series backend with server-side aggregation.
#[allow(async_fn_in_trait)]
pub trait MetricsSource {
    /// Sum `query.metric_type` over the whole window, grouped by the query's
    /// resource label. Returns label value -> total.
    async fn sum_by_label(
        &self,
        query: &MetricQuery,
    ) -> Result<BTreeMap<String, f64>, CollaboratorError>;
}

/// A structured audit log.
#[allow(async_fn_in_trait)]
pub trait AuditLogSource {
    async fn creation_events(
        &self,
        query: &AuditQuery,
    ) -> Result<Vec<CreationEvent>, CollaboratorError>;
}

// ============================================================================
// Query types
// ============================================================================

/// A closed time interval ending now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn lookback(days: u32) -> Self {
        let end = Utc::now();
        Self {
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }

    pub fn seconds(&self) -> i64 {
        (self.end - self.start).num_seconds().max(1)
    }
}

/// An aggregated metric query: one bucket covering the whole window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    pub metric_type: &'static str,
    pub resource_type: &'static str,
    /// Resource label to group by, e.g. `service_name`
    pub group_by: &'static str,
    pub window: TimeWindow,
}

impl MetricQuery {
    pub fn filter(&self) -> String {
        format!(
            r#"metric.type = "{}" AND resource.type = "{}""#,
            self.metric_type, self.resource_type
        )
    }

    pub fn group_by_field(&self) -> String {
        format!("resource.label.{}", self.group_by)
    }
}

/// Method-name fragments that mark a resource creation.
pub const CREATION_METHODS: &[&str] = &["create", "insert", "deploy"];

/// Broader set used for the creation activity report.
pub const ACTIVITY_METHODS: &[&str] = &["create", "insert", "deploy", "build"];

/// An audit-log search for creation events of one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditQuery {
    pub project: String,
    pub service_api: String,
    pub since: DateTime<Utc>,
    pub methods: &'static [&'static str],
    /// Also match operations produced by CI deployments from GitHub
    pub include_github_producer: bool,
}

impl AuditQuery {
    /// Creation events (create/insert/deploy) within the lookback window.
    pub fn creations(project: &str, service_api: &str, lookback_days: u32) -> Self {
        Self {
            project: project.to_string(),
            service_api: service_api.to_string(),
            since: Utc::now() - Duration::days(i64::from(lookback_days)),
            methods: CREATION_METHODS,
            include_github_producer: false,
        }
    }

    /// Creation and build activity, including GitHub-produced operations.
    pub fn activity(project: &str, service_api: &str, lookback_days: u32) -> Self {
        Self {
            methods: ACTIVITY_METHODS,
            include_github_producer: true,
            ..Self::creations(project, service_api, lookback_days)
        }
    }

    /// Render the Cloud Logging filter expression.
    pub fn to_filter(&self) -> String {
        let mut clauses: Vec<String> = self
            .methods
            .iter()
            .map(|m| format!(r#"protoPayload.methodName:"{}""#, m))
            .collect();
        if self.include_github_producer {
            clauses.push(r#"operation.producer:"github.com""#.to_string());
        }

        format!(
            r#"logName="projects/{}/logs/cloudaudit.googleapis.com%2Factivity" AND timestamp >= "{}" AND protoPayload.serviceName="{}" AND ({})"#,
            self.project,
            self.since.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.service_api,
            clauses.join(" OR ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_creation_filter() {
        let query = AuditQuery {
            project: "acme".to_string(),
            service_api: "sqladmin.googleapis.com".to_string(),
            since: Utc.with_ymd_and_hms(2026, 9, 18, 12, 0, 0).unwrap(),
            methods: CREATION_METHODS,
            include_github_producer: false,
        };
        assert_eq!(
            query.to_filter(),
            r#"logName="projects/acme/logs/cloudaudit.googleapis.com%2Factivity" AND timestamp >= "2026-09-18T12:00:00.000000Z" AND protoPayload.serviceName="sqladmin.googleapis.com" AND (protoPayload.methodName:"create" OR protoPayload.methodName:"insert" OR protoPayload.methodName:"deploy")"#
        );
    }

    #[test]
    fn test_activity_filter_includes_build_and_github() {
        let filter = AuditQuery::activity("acme", "run.googleapis.com", 30).to_filter();
        assert!(filter.contains(r#"protoPayload.methodName:"build""#));
        assert!(filter.ends_with(r#"OR operation.producer:"github.com")"#));
    }

    #[test]
    fn test_window_seconds() {
        let window = TimeWindow::lookback(30);
        let secs = window.seconds();
        assert!((30 * 86_400 - 1..=30 * 86_400 + 1).contains(&secs));
    }

    #[test]
    fn test_metric_filter() {
        let query = MetricQuery {
            metric_type: "run.googleapis.com/container/billable_instance_time",
            resource_type: "cloud_run_revision",
            group_by: "service_name",
            window: TimeWindow::lookback(1),
        };
        assert_eq!(
            query.filter(),
            r#"metric.type = "run.googleapis.com/container/billable_instance_time" AND resource.type = "cloud_run_revision""#
        );
        assert_eq!(query.group_by_field(), "resource.label.service_name");
    }
}
