use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AttributionError>;

#[derive(Error, Debug)]
pub enum AttributionError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cloud collaborator setup failed: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Problems with the billing export. These abort the run.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("No billing export found in {}", dir.display())]
    NoBillingExport { dir: PathBuf },

    #[error("Billing export {} is missing required columns: {}", file.display(), missing.join(", "))]
    MissingColumns { file: PathBuf, missing: Vec<String> },

    #[error("Malformed value {value:?} in column '{column}' at row {row}")]
    MalformedValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Failed to read billing export {}: {reason}", file.display())]
    Unreadable { file: PathBuf, reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse configuration: {0}")]
    ParsingFailed(String),

    #[error("Missing project id (set project_id in the config file or pass --project)")]
    MissingProject,
}

/// Failures of the external inventory, metrics or audit-log collaborators.
///
/// Never fatal: callers log them and degrade to "no data".
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("Failed to launch '{command}': {reason}")]
    Spawn { command: String, reason: String },

    #[error("'{command}' exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("'{command}' timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    #[error("Unparsable output from '{command}': {reason}")]
    InvalidOutput { command: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{api} returned HTTP {status}: {body}")]
    Api {
        api: &'static str,
        status: u16,
        body: String,
    },

    #[error("No access token available for {0}")]
    MissingCredentials(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message() {
        let err = InputError::MissingColumns {
            file: PathBuf::from("billing.csv"),
            missing: vec!["Cost ($)".to_string(), "Usage unit".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("billing.csv"));
        assert!(msg.contains("Cost ($), Usage unit"));
    }

    #[test]
    fn test_input_error_converts() {
        let err: AttributionError = InputError::NoBillingExport {
            dir: PathBuf::from("."),
        }
        .into();
        assert!(matches!(err, AttributionError::Input(_)));
    }

    #[test]
    fn test_collaborator_timeout_message() {
        let err = CollaboratorError::Timeout {
            command: "gcloud sql instances list".to_string(),
            secs: 60,
        };
        assert_eq!(err.to_string(), "'gcloud sql instances list' timed out after 60s");
    }
}
