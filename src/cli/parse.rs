//! CLI parse: clap types for framebridge. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Framebridge CLI - inspect configuration and exercise the message bridge
#[derive(Parser)]
#[command(name = "framebridge")]
#[command(about = "Secure host/embedded-content message bridge")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load, validate and print the effective configuration
    CheckConfig,
    /// Attach a bridge to an in-memory echo context and issue requests
    Simulate {
        /// Number of concurrent requests
        #[arg(long, default_value = "3")]
        requests: usize,
        /// Per-request timeout in milliseconds (defaults to the configured value)
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Leave requests unanswered to observe timeouts
        #[arg(long)]
        silent: bool,
        /// Isolation flags granted to the simulated context, e.g. "allow-scripts,allow-forms"
        #[arg(long)]
        isolation_flags: Option<String>,
    },
}
