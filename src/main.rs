//! Shepherd CLI entry point.

use std::path::Path;

use anyhow::Result;
use clap::Parser;

use shepherd::cli::commands::{check, layout, reconcile, sweep};
use shepherd::cli::context::load_config;
use shepherd::cli::{handle_error, Cli, Commands};
use shepherd::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let Cli {
        command,
        json,
        config,
    } = Cli::parse();

    if let Err(err) = run(command, config.as_deref(), json).await {
        handle_error(err, json);
    }
}

async fn run(command: Commands, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let log_config = LogConfig::try_from(&config.logging)?.with_json(json);
    let _logger = LoggerImpl::init(&log_config)?;

    match command {
        Commands::Check(args) => check::execute(args, config, json).await,
        Commands::Reconcile(args) => reconcile::execute(args, config, json).await,
        Commands::Sweep(args) => sweep::execute(args, config, json).await,
        Commands::Layout => layout::execute(config, json).await,
    }
}
