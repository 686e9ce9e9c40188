use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fuelwatch::application::{Cli, CommandExecutor};
use fuelwatch::shared::config::ConfigLoader;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = ConfigLoader::load(cli.config.as_deref()).context("failed to load configuration")?;

    CommandExecutor::execute(cli.command, config).await
}
