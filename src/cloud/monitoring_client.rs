//! Cloud Monitoring client for aggregated usage metrics.
//!
//! Asks the backend to sum every point of a metric over the whole lookback
//! window, grouped by one resource label, so only one value per group is
//! downloaded instead of the raw series.
//!
//! # Example
//!
//! ```rust,ignore
//! use cost_attribution::cloud::{MetricQuery, MetricsSource, MonitoringClient, TimeWindow};
//!
//! let client = MonitoringClient::new("acme-prod", Some(token))?;
//! let usage = client
//!     .sum_by_label(&MetricQuery {
//!         metric_type: "run.googleapis.com/container/billable_instance_time",
//!         resource_type: "cloud_run_revision",
//!         group_by: "service_name",
//!         window: TimeWindow::lookback(30),
//!     })
//!     .await?;
//! ```

use super::{MetricQuery, MetricsSource};
use crate::error::CollaboratorError;
use chrono::SecondsFormat;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

const MONITORING_API: &str = "https://monitoring.googleapis.com/v3";

/// Cloud Monitoring REST client.
pub struct MonitoringClient {
    base_url: String,
    project: String,
    http_client: Client,
    token: Option<String>,
}

impl MonitoringClient {
    pub fn new(project: &str, token: Option<String>) -> Result<Self, CollaboratorError> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: MONITORING_API.to_string(),
            project: project.to_string(),
            http_client,
            token,
        })
    }

    /// Build the `timeSeries.list` URL for one page.
    fn list_url(&self, query: &MetricQuery, page_token: Option<&str>) -> String {
        let params = [
            ("filter", query.filter()),
            (
                "interval.startTime",
                query.window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            (
                "interval.endTime",
                query.window.end.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            (
                "aggregation.alignmentPeriod",
                format!("{}s", query.window.seconds()),
            ),
            ("aggregation.perSeriesAligner", "ALIGN_SUM".to_string()),
            ("aggregation.crossSeriesReducer", "REDUCE_SUM".to_string()),
            ("aggregation.groupByFields", query.group_by_field()),
            ("view", "FULL".to_string()),
        ];

        let mut url = format!(
            "{}/projects/{}/timeSeries?{}",
            self.base_url,
            self.project,
            params
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&")
        );
        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }
        url
    }
}

impl MetricsSource for MonitoringClient {
    async fn sum_by_label(
        &self,
        query: &MetricQuery,
    ) -> Result<BTreeMap<String, f64>, CollaboratorError> {
        let token = self
            .token
            .as_deref()
            .ok_or(CollaboratorError::MissingCredentials("Cloud Monitoring"))?;

        let mut totals = BTreeMap::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = self.list_url(query, page_token.as_deref());
            log::debug!("Querying Cloud Monitoring for {}", query.metric_type);

            let response = self.http_client.get(&url).bearer_auth(token).send().await?;
            if !response.status().is_success() {
                return Err(CollaboratorError::Api {
                    api: "Cloud Monitoring",
                    status: response.status().as_u16(),
                    body: response.text().await.unwrap_or_default(),
                });
            }

            let page: ListTimeSeriesResponse = response.json().await?;
            accumulate(&page.time_series, query.group_by, &mut totals);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        totals.retain(|_, total| *total > 0.0);
        Ok(totals)
    }
}

// ============================================================================
// Cloud Monitoring API response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTimeSeriesResponse {
    #[serde(default)]
    time_series: Vec<TimeSeries>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeSeries {
    #[serde(default)]
    resource: MonitoredResource,
    #[serde(default)]
    points: Vec<Point>,
}

#[derive(Debug, Default, Deserialize)]
struct MonitoredResource {
    #[serde(default)]
    labels: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Point {
    value: TypedValue,
}

/// int64 values travel as JSON strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypedValue {
    double_value: Option<f64>,
    int64_value: Option<String>,
    distribution_value: Option<Distribution>,
}

#[derive(Debug, Deserialize)]
struct Distribution {
    count: Option<String>,
    mean: Option<f64>,
}

// ============================================================================
// Helper functions
// ============================================================================

/// Numeric value of a point. Distributions count as mean x count.
fn point_value(value: &TypedValue) -> f64 {
    if let Some(v) = value.double_value {
        return v;
    }
    if let Some(v) = value.int64_value.as_deref().and_then(|s| s.parse::<f64>().ok()) {
        return v;
    }
    if let Some(dist) = &value.distribution_value {
        let count = dist
            .count
            .as_deref()
            .and_then(|c| c.parse::<f64>().ok())
            .unwrap_or(0.0);
        return dist.mean.unwrap_or(0.0) * count;
    }
    0.0
}

fn accumulate(series: &[TimeSeries], label: &str, totals: &mut BTreeMap<String, f64>) {
    for ts in series {
        let name = ts
            .resource
            .labels
            .get(label)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        let total: f64 = ts
            .points
            .iter()
            .map(|p| point_value(&p.value))
            .filter(|v| v.is_finite())
            .sum();
        *totals.entry(name).or_insert(0.0) += total;
    }
}
