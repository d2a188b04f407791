//! Weir - declarative data-pipeline host
//!
//! # Usage
//!
//! ```bash
//! # Run the pipelines (default)
//! weir
//! weir --config configs/pipelines.toml
//!
//! # Validate a configuration without starting anything
//! weir validate --config configs/pipelines.toml
//! ```

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Weir - declarative data-pipeline host
#[derive(Parser, Debug)]
#[command(name = "weir")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to a pipeline configuration file or directory
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble the topology and run it until interrupted
    Serve(cmd::serve::ServeArgs),

    /// Validate a configuration without instantiating any plugin
    Validate(cmd::validate::ValidateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Serve(mut args)) => {
            if args.config.is_none() && cli.config.is_some() {
                args.config = cli.config;
            }
            init_logging(cli.log_level.as_deref().unwrap_or("info"))?;
            cmd::serve::run(args).await
        }
        Some(Command::Validate(mut args)) => {
            // Validate prints to stdout, no logging needed
            if args.config.is_none() && cli.config.is_some() {
                args.config = cli.config;
            }
            cmd::validate::run(args)
        }
        // No subcommand = serve
        None => {
            init_logging(cli.log_level.as_deref().unwrap_or("info"))?;
            let args = cmd::serve::ServeArgs { config: cli.config };
            cmd::serve::run(args).await
        }
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}
