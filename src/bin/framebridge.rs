//! Framebridge CLI Binary
//!
//! Command-line interface for inspecting configuration and exercising the bridge.

use clap::Parser;
use framebridge::cli::{Cli, RunContext};
use framebridge::config::ConfigLoader;
use framebridge::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Framebridge CLI starting");

    if let Err(e) = run(cli).await {
        error!("Command failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let context = RunContext::new(cli.workspace.clone(), cli.config.clone())?;
    let output = context.execute(&cli.command).await?;
    info!("Command completed successfully");
    println!("{}", output);
    Ok(())
}

/// Build logging configuration from CLI args, environment, and config file
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(&cli.workspace),
    }
    .map(|settings| settings.logging)
    .unwrap_or_default();

    if cli.verbose {
        config.level = "debug".to_string();
    } else if std::env::var("FRAMEBRIDGE_LOG").is_err() {
        config.level = "off".to_string();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    config
}
