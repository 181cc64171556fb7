//! Shared CLI scaffolding for the orchestrator binaries: argument
//! parsing and logging setup, thin over `arb_core::utils::logger`.

use anyhow::Result;
use clap::Parser;

/// Common CLI arguments shared by the orchestrator binaries.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CommonArgs {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Override the configured log level.
    #[arg(short, long)]
    pub log_level: Option<String>,
}

/// Initialize tracing using the level/format from config, overridden by
/// `--log-level` if given.
pub fn init_logging(configured_level: &str, json: bool, override_level: Option<&str>) -> Result<()> {
    let level = override_level.unwrap_or(configured_level);
    arb_core::utils::init_logger(level, json);
    Ok(())
}
