use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

use fressnapfd::config::Config;
use fressnapfd::{api, poller, SharedState};

/// Daemon polling Fressnapf pet trackers and exposing their sensor values.
#[derive(Parser)]
#[command(name = "fressnapfd", version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "fressnapfd.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::from_file(&args.config)?;

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(config.logging.level))
        .init();

    tracing::info!("fressnapfd starting");
    tracing::info!("Loaded config from: {}", args.config.display());

    let state = SharedState::default();

    // One polling task per configured tracker
    let mut poller_handles = Vec::new();
    for (name, tracker) in config.trackers.clone() {
        tracing::info!(
            "Starting poller for tracker '{}' (serial: {}, interval: {}s)",
            name,
            tracker.serial_number,
            tracker.poll_interval_seconds
        );
        poller_handles.push(tokio::spawn(poller::run(name, tracker, state.clone())));
    }

    // Optional read-only HTTP API
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let api_handle = match &config.api {
        Some(api_config) if api_config.enabled => Some(tokio::spawn(api::serve(
            api_config.listen.clone(),
            api_config.port,
            Arc::new(config.trackers.clone()),
            state.clone(),
            shutdown_rx,
        ))),
        _ => None,
    };

    // Wait for Ctrl+C
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received shutdown signal");
        }
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
    }

    let _ = shutdown_tx.send(());
    if let Some(handle) = api_handle {
        if let Err(e) = handle.await? {
            tracing::error!("HTTP API server error: {}", e);
        }
    }

    for handle in poller_handles {
        handle.abort();
    }

    tracing::info!("fressnapfd shutdown complete");
    Ok(())
}
