use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::Parser;
use kikizake_cli::{execute, init_logging, Cli};
use kikizake_core::config::{AppConfig, LoadOptions};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Config errors are reported by the command itself as a JSON payload.
    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config.logging)
            .map_err(|error| anyhow!("failed to initialize logging: {error}"))?;
    }

    Ok(execute(cli))
}
