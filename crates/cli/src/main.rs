//! Stepwatch CLI - Main Entry Point
//!
//! Classifies load times against SLA bands, prints the resolved threshold
//! configuration and runs YAML browser scenarios.

use clap::{Parser, Subcommand};

use stepwatch_cli::commands::{classify, run, thresholds};
use stepwatch_cli::output;

/// Stepwatch - navigation timing and SLA checks for browser acceptance tests
#[derive(Parser)]
#[command(name = "stepwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios against a WebDriver endpoint
    Run(run::RunArgs),

    /// Classify a measured duration against warn/fail thresholds
    Classify(classify::ClassifyArgs),

    /// Show the resolved threshold profiles
    Thresholds(thresholds::ThresholdsArgs),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run(args) => {
            if !run::execute(args, cli.format).await? {
                std::process::exit(1);
            }
        }
        Commands::Classify(args) => classify::execute(args, cli.format)?,
        Commands::Thresholds(args) => thresholds::execute(args, cli.format)?,
        Commands::Version => {
            println!("stepwatch v{}", env!("CARGO_PKG_VERSION"));
            println!("Core library v{}", stepwatch_common::VERSION);
        }
    }

    Ok(())
}
