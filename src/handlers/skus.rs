//! Handler for the `skus` command. Works offline.

use super::utils::{load_top_items, output_dir, requested_ranking, resolve_config, status};
use crate::attribution::ReportWriter;
use crate::attribution::formatter::format_top_skus;
use crate::cli::{GlobalArgs, InputArgs, OutputArgs};
use crate::error::Result;

pub fn handle_skus(
    global: &GlobalArgs,
    input: &InputArgs,
    output: &OutputArgs,
    write: bool,
) -> Result<()> {
    let config = resolve_config(global, input)?;
    let (export, items) = load_top_items(input, &config, requested_ranking(input))?;
    status(
        global,
        &format!("📄 {} top line items from {}", items.len(), export.display()),
    );

    println!("{}", format_top_skus(&items, output.format));

    if write {
        let path = ReportWriter::new(output_dir(input, output)).write_top_skus(&items)?;
        status(global, &format!("✅ Wrote {}", path.display()));
    }
    Ok(())
}
