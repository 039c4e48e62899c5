//! Handler for the `creators` command: creation activity per top line item.
//!
//! Export rows are always grouped by (service, SKU) here, so each line item
//! appears once with its creators.

use super::utils::{
    load_top_items, output_dir, require_project, resolve_access_token, resolve_config, status,
};
use crate::attribution::{Ranking, ReportWriter};
use crate::attribution::creation_summary::summarize_creations;
use crate::attribution::formatter::format_creator_summary;
use crate::cli::{GlobalArgs, InputArgs, OutputArgs};
use crate::cloud::{GcloudCli, LoggingClient};
use crate::error::Result;

pub async fn handle_creators(
    global: &GlobalArgs,
    input: &InputArgs,
    output: &OutputArgs,
) -> Result<()> {
    let config = resolve_config(global, input)?;
    let project = require_project(&config)?;
    let (export, items) = load_top_items(input, &config, Ranking::Grouped)?;
    status(
        global,
        &format!("📄 {} top line items from {}", items.len(), export.display()),
    );

    let gcloud = GcloudCli::new(config.gcloud_binary.clone(), project.clone(), config.cli_timeout_secs);
    let token = resolve_access_token(global.access_token.as_deref(), &gcloud).await;
    let audit = LoggingClient::new(token, config.max_audit_entries)?;

    let summary = summarize_creations(&audit, &config, &project, &items).await;

    let writer = ReportWriter::new(output_dir(input, output));
    let skus_path = writer.write_top_skus(&items)?;
    let summary_path = writer.write_creator_summary(&summary)?;

    println!("{}", format_creator_summary(&summary, output.format));
    status(
        global,
        &format!("✅ Wrote {} and {}", skus_path.display(), summary_path.display()),
    );
    Ok(())
}
