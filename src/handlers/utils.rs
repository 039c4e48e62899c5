//! Shared setup for the command handlers.

use crate::attribution::{LineItem, Ranking, find_billing_export, load_line_items};
use crate::cli::{GlobalArgs, InputArgs, OutputArgs};
use crate::cloud::GcloudCli;
use crate::config::{Config, load_config};
use crate::error::{ConfigError, Result};
use colored::Colorize;
use std::path::PathBuf;

/// Load the config file and apply command-line overrides.
pub fn resolve_config(global: &GlobalArgs, input: &InputArgs) -> Result<Config> {
    let mut config = load_config(global.config.as_deref(), &input.dir)?;

    if let Some(project) = &global.project {
        config = config.with_project(project.clone());
    }
    if let Some(days) = global.lookback_days {
        if days == 0 {
            return Err(ConfigError::InvalidConfig("--lookback-days must be at least 1".into()).into());
        }
        config = config.with_lookback_days(days);
    }
    if let Some(top) = input.top {
        if top == 0 {
            return Err(ConfigError::InvalidConfig("--top must be at least 1".into()).into());
        }
        config = config.with_top_k(top);
    }
    Ok(config)
}

pub fn require_project(config: &Config) -> Result<String> {
    config
        .project_id
        .clone()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingProject.into())
}

/// Grouped when `--grouped` is given, raw export rows otherwise.
pub fn requested_ranking(input: &InputArgs) -> Ranking {
    if input.grouped {
        Ranking::Grouped
    } else {
        Ranking::Raw
    }
}

/// Locate the export and load the configured number of top line items.
pub fn load_top_items(
    input: &InputArgs,
    config: &Config,
    ranking: Ranking,
) -> Result<(PathBuf, Vec<LineItem>)> {
    let path = match &input.billing_csv {
        Some(path) => path.clone(),
        None => find_billing_export(&input.dir)?,
    };

    let items = load_line_items(&path, ranking, config.top_k)?;
    log::info!(
        "Loaded {} line items from {} ({:?} ranking)",
        items.len(),
        path.display(),
        ranking
    );
    Ok((path, items))
}

pub fn output_dir(input: &InputArgs, output: &OutputArgs) -> PathBuf {
    output.output_dir.clone().unwrap_or_else(|| input.dir.clone())
}

/// The explicit token if given, else the gcloud session's. Without a token
/// the metric and audit queries fail and degrade per line item.
pub async fn resolve_access_token(explicit: Option<&str>, gcloud: &GcloudCli) -> Option<String> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }
    match gcloud.access_token().await {
        Ok(token) => Some(token),
        Err(e) => {
            log::warn!("No access token for the monitoring and logging APIs: {}", e);
            None
        }
    }
}

/// Progress line on stderr, so JSON on stdout stays clean.
pub fn status(global: &GlobalArgs, message: &str) {
    if !global.quiet {
        eprintln!("{}", message.bright_blue());
    }
}
