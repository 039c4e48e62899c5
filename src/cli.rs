use crate::attribution::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cost-attrib")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Attribute cloud billing costs to resources and the people who created them")]
#[command(long_about = "Reads a billing export, ranks the top cost line items, splits each one across the live resources that consumed it (VMs, disks, databases, Cloud Run services, functions, App Engine versions, model endpoints) and joins every resource to the identity that created it via the audit log.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Cloud project to query
    #[arg(long, global = true, env = "CLOUDSDK_CORE_PROJECT", value_name = "PROJECT_ID")]
    pub project: Option<String>,

    /// Days of audit logs and metrics to look back over
    #[arg(long, global = true, value_name = "DAYS")]
    pub lookback_days: Option<u32>,

    /// OAuth access token for the monitoring and logging APIs
    /// (defaults to `gcloud auth print-access-token`)
    #[arg(
        long,
        global = true,
        env = "GOOGLE_OAUTH_ACCESS_TOKEN",
        hide_env_values = true,
        value_name = "TOKEN"
    )]
    pub access_token: Option<String>,
}

/// Where the billing export comes from and how it is ranked.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Billing export CSV (defaults to the first export found in --dir)
    #[arg(long, value_name = "FILE")]
    pub billing_csv: Option<PathBuf>,

    /// Directory searched for the billing export and config file
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Number of top line items to process
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Sum rows per (service, SKU) before ranking (always on for `creators`)
    #[arg(long)]
    pub grouped: bool,
}

/// Where and how results are reported.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Directory the CSV reports are written to (defaults to --dir)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Console output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split the top line items across resources and their creators
    Breakdown {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Pause between line items in milliseconds
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,
    },

    /// Summarise who created resources in the services behind the top line items
    Creators {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List the top line items without querying the cloud
    Skus {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Also write the ranked line items to CSV
        #[arg(long)]
        write: bool,
    },
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.global.quiet {
            return;
        }

        let level = match self.global.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}
