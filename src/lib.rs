//! # Cost Attribution CLI
//!
//! Reconciles a static cloud billing export with live inventory, metrics and
//! audit data to attribute cost to resources and to the people who created
//! them.
//!
//! ## Features
//!
//! - **Billing Loader**: Parses the cost export and ranks the top line items
//! - **Usage Adapters**: Weighs VMs, disks, databases, serverless services, app
//!   versions and model endpoints by their live size or usage
//! - **Creator Lookup**: Joins each resource to its creator via audit logs
//! - **Fallback Estimates**: Splits unsupported services by creation activity
//! - **Reports**: CSV breakdowns plus table or JSON console output
//!
//! ## Example
//!
//! ```rust,no_run
//! use cost_attribution::attribution::{Ranking, load_line_items};
//! use std::path::Path;
//!
//! # fn main() -> cost_attribution::Result<()> {
//! let items = load_line_items(Path::new("billing.csv"), Ranking::Raw, 10)?;
//! for item in &items {
//!     println!("{} / {}: ${:.2}", item.service, item.sku, item.total_cost);
//! }
//! # Ok(())
//! # }
//! ```

pub mod attribution;
pub mod cli;
pub mod cloud;
pub mod common;
pub mod config;
pub mod error;
pub mod handlers;

pub use error::{AttributionError, Result};
pub use handlers::*;
use cli::{Commands, GlobalArgs};

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn run_command(global: &GlobalArgs, command: Commands) -> Result<()> {
    match command {
        Commands::Breakdown {
            input,
            output,
            delay_ms,
        } => handle_breakdown(global, &input, &output, delay_ms).await,
        Commands::Creators { input, output } => handle_creators(global, &input, &output).await,
        Commands::Skus {
            input,
            output,
            write,
        } => handle_skus(global, &input, &output, write),
    }
}
