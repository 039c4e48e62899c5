//! Cost attribution pipeline.
//!
//! Billing export -> top line items -> per-service usage adapters ->
//! proportional allocation -> creator lookup -> reports.

pub mod adapters;
pub mod allocator;
pub mod billing;
pub mod creation_summary;
pub mod creators;
pub mod dispatcher;
pub mod fallback;
pub mod formatter;
pub mod report;
pub mod types;

pub use allocator::allocate;
pub use billing::{Ranking, find_billing_export, load_line_items};
pub use dispatcher::Dispatcher;
pub use formatter::OutputFormat;
pub use report::{ReportWriter, sort_rows, summarize_by_person};
pub use types::*;
