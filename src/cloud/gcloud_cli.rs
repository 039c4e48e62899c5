//! Inventory queries through the `gcloud` CLI.

use super::InventorySource;
use crate::common::command_utils::{execute_json, execute_with_timeout};
use crate::error::CollaboratorError;
use std::time::Duration;

/// Project-scoped `gcloud` runner with a hard per-call timeout.
#[derive(Debug, Clone)]
pub struct GcloudCli {
    binary: String,
    project: String,
    timeout: Duration,
}

impl GcloudCli {
    pub fn new(binary: impl Into<String>, project: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            binary: binary.into(),
            project: project.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Full argument list for a listing call.
    pub fn scoped_args(&self, args: &[&str]) -> Vec<String> {
        args.iter()
            .map(|a| a.to_string())
            .chain([
                format!("--project={}", self.project),
                "--format=json".to_string(),
            ])
            .collect()
    }

    /// Access token of the ambient gcloud session, for the REST collaborators.
    pub async fn access_token(&self) -> Result<String, CollaboratorError> {
        let args = vec!["auth".to_string(), "print-access-token".to_string()];
        let output = execute_with_timeout(&self.binary, &args, self.timeout).await?;
        if !output.status.success() {
            return Err(CollaboratorError::CommandFailed {
                command: format!("{} auth print-access-token", self.binary),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(CollaboratorError::MissingCredentials("gcloud session"));
        }
        Ok(token)
    }
}

impl InventorySource for GcloudCli {
    async fn query(&self, args: &[&str]) -> Result<serde_json::Value, CollaboratorError> {
        execute_json(&self.binary, &self.scoped_args(args), self.timeout).await
    }
}
