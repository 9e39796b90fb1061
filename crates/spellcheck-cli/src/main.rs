//! Spellcheck CLI entry point

use clap::Parser;
use tracing::{error, info};

use spellcheck_cli::{cli::Cli, commands::CommandDispatcher, config::AppConfig, error::Result};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = load_configuration(&cli)?;
    // --data-dir wins over the config file
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = Some(data_dir.into());
    }

    if let Err(e) = CommandDispatcher::execute(cli, config).await {
        error!("spellcheck failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Plain INFO logging, DEBUG with --verbose
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Tracker configuration from --config, or the built-in defaults
fn load_configuration(cli: &Cli) -> Result<AppConfig> {
    if let Some(config_path) = &cli.config {
        info!("Reading tracker configuration from {}", config_path);
        AppConfig::load_from_file(config_path)
    } else {
        info!("No --config given, using default tracker settings");
        Ok(AppConfig::default())
    }
}
