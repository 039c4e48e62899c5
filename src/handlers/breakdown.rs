//! Handler for the `breakdown` command.
//!
//! Attributes each top line item to resources and creators, then writes
//! `resource_cost_breakdown.csv` and `person_cost_summary.csv`.

use super::utils::{
    load_top_items, output_dir, require_project, requested_ranking, resolve_access_token,
    resolve_config, status,
};
use crate::attribution::formatter::format_breakdown;
use crate::attribution::{Dispatcher, ReportWriter, sort_rows, summarize_by_person};
use crate::cli::{GlobalArgs, InputArgs, OutputArgs};
use crate::cloud::{GcloudCli, LoggingClient, MonitoringClient};
use crate::common::command_utils::is_command_available;
use crate::error::Result;

pub async fn handle_breakdown(
    global: &GlobalArgs,
    input: &InputArgs,
    output: &OutputArgs,
    delay_ms: Option<u64>,
) -> Result<()> {
    let mut config = resolve_config(global, input)?;
    if let Some(delay) = delay_ms {
        config = config.with_request_delay_ms(delay);
    }
    let project = require_project(&config)?;
    let (export, items) = load_top_items(input, &config, requested_ranking(input))?;
    status(
        global,
        &format!("📄 {} top line items from {}", items.len(), export.display()),
    );

    let gcloud = GcloudCli::new(config.gcloud_binary.clone(), project.clone(), config.cli_timeout_secs);
    if !is_command_available(gcloud.binary()) {
        log::warn!(
            "'{}' not found; inventory lookups will fall back to audit-log estimates",
            gcloud.binary()
        );
    }
    let token = resolve_access_token(global.access_token.as_deref(), &gcloud).await;
    let metrics = MonitoringClient::new(&project, token.clone())?;
    let audit = LoggingClient::new(token, config.max_audit_entries)?;

    let dispatcher = Dispatcher::new(&config, &project, &gcloud, &metrics, &audit);
    let total = items.len();
    let mut rows = dispatcher
        .attribute_all(&items, |i, item| {
            status(
                global,
                &format!("🔍 [{}/{}] {} / {}", i + 1, total, item.service, item.sku),
            );
        })
        .await;

    sort_rows(&mut rows);
    let people = summarize_by_person(&rows);

    let writer = ReportWriter::new(output_dir(input, output));
    let breakdown_path = writer.write_breakdown(&rows)?;
    let people_path = writer.write_person_summary(&people)?;

    println!("{}", format_breakdown(&rows, &people, output.format));
    status(
        global,
        &format!(
            "✅ Wrote {} and {}",
            breakdown_path.display(),
            people_path.display()
        ),
    );
    Ok(())
}
