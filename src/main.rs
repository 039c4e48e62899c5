use clap::Parser;
use cost_attribution::cli::Cli;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging();

    if let Err(e) = cost_attribution::run_command(&cli.global, cli.command).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
