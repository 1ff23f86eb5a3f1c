//! drand oracle updater - Entry Point
//!
//! Relays drand randomness rounds into the on-chain oracle contract.

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// drand oracle updater
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via UPDATER_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    updater_telemetry::init_logging()?;

    info!("Starting drand oracle updater v{}", env!("CARGO_PKG_VERSION"));

    // Determine config path: CLI arg > UPDATER_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("UPDATER_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let config = updater_bin::AppConfig::from_file(&config_path)?;
    info!(
        chain_id = config.chain.chain_id,
        oracle = %config.chain.oracle_address,
        drand_urls = ?config.drand.urls,
        "Configuration loaded"
    );

    let app = updater_bin::Application::new(config)?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                shutdown.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    app.run(cancel).await?;

    info!("Shutting down");
    Ok(())
}
