//! Binary crate for the `livability` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Human-friendly output formatting

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

const DEFAULT_FILTER: &str = "livability_core=info,livability=info";
const VERBOSE_FILTER: &str = "livability_core=debug,livability=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();

    let default = if cmd.verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    cmd.run().await
}
