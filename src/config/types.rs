use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cloud project the inventory, metrics and audit queries are scoped to
    pub project_id: Option<String>,
    /// Look back period in days for audit logs and metrics
    pub lookback_days: u32,
    /// Number of top line items to attribute
    pub top_k: usize,
    /// Pause between line items to stay under backend rate limits
    pub request_delay_ms: u64,
    /// Hard timeout for a single inventory CLI invocation
    pub cli_timeout_secs: u64,
    /// Upper bound on audit-log entries read per query
    pub max_audit_entries: usize,
    /// Regions scanned for model-serving endpoints
    pub endpoint_regions: Vec<String>,
    /// Inventory CLI binary
    pub gcloud_binary: String,
    /// Billing "Service description" -> audit-log `serviceName`
    pub service_mapping: BTreeMap<String, String>,
}

impl Config {
    /// API service name for a billing service label, if mapped.
    pub fn api_service(&self, service: &str) -> Option<&str> {
        self.service_mapping.get(service).map(String::as_str)
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project_id = Some(project.into());
        self
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_request_delay_ms(mut self, delay: u64) -> Self {
        self.request_delay_ms = delay;
        self
    }
}

fn default_service_mapping() -> BTreeMap<String, String> {
    [
        ("Cloud Run", "run.googleapis.com"),
        ("Cloud SQL", "sqladmin.googleapis.com"),
        ("Vertex AI", "aiplatform.googleapis.com"),
        ("App Engine", "appengine.googleapis.com"),
        ("Compute Engine", "compute.googleapis.com"),
        ("Cloud Run Functions", "cloudfunctions.googleapis.com"),
        ("Cloud Workstations", "workstations.googleapis.com"),
        ("Notebooks", "notebooks.googleapis.com"),
        ("Cloud Spanner", "spanner.googleapis.com"),
        ("Kubernetes Engine", "container.googleapis.com"),
        ("Integration Connectors", "connectors.googleapis.com"),
        ("Gemini API", "aiplatform.googleapis.com"),
        // Load balancers and other networking resources are logged under Compute
        ("Networking", "compute.googleapis.com"),
        ("Artifact Registry", "artifactregistry.googleapis.com"),
        ("Cloud Monitoring", "monitoring.googleapis.com"),
        ("Secret Manager", "secretmanager.googleapis.com"),
        ("BigQuery", "bigquery.googleapis.com"),
        ("Cloud Storage", "storage.googleapis.com"),
        ("Dataplex", "dataplex.googleapis.com"),
        ("Cloud DNS", "dns.googleapis.com"),
        ("Cloud Build", "cloudbuild.googleapis.com"),
        ("Firebase App Hosting", "firebaseapphosting.googleapis.com"),
        ("Cloud Pub/Sub", "pubsub.googleapis.com"),
        ("VM Manager", "compute.googleapis.com"),
        ("Cloud Logging", "logging.googleapis.com"),
    ]
    .into_iter()
    .map(|(label, api)| (label.to_string(), api.to_string()))
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: None,
            lookback_days: 30,
            top_k: 10,
            request_delay_ms: 1000,
            cli_timeout_secs: 60,
            max_audit_entries: 1000,
            endpoint_regions: vec![
                "us-central1".to_string(),
                "us-east1".to_string(),
                "us-west1".to_string(),
                "europe-west1".to_string(),
            ],
            gcloud_binary: "gcloud".to_string(),
            service_mapping: default_service_mapping(),
        }
    }
}
