//! # parleyd
//!
//! Parley relay server binary — loads settings, starts the
//! HTTP/WebSocket server, and coordinates graceful shutdown.

#![deny(unsafe_code)]

mod settings;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use parley_server::server::ParleyServer;
use parley_server::shutdown::ShutdownCoordinator;

/// Parley relay server.
#[derive(Parser, Debug)]
#[command(name = "parleyd", about = "Parley message relay server")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings; 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the settings file (default `~/.parley/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Public URL for the WebSocket origin check (overrides settings).
    #[arg(long)]
    public_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let settings_file = cli.settings.unwrap_or_else(settings::settings_path);
    let mut config = settings::load_settings_from_path(&settings_file)
        .with_context(|| format!("failed to load settings from {}", settings_file.display()))?;

    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(public_url) = cli.public_url {
        config.public_url = Some(public_url);
    }

    let server = ParleyServer::new(config);
    let addr = server.listen().await?;
    info!(%addr, default_room = server.config().default_room, "parleyd started");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");

    server
        .shutdown()
        .drain(ShutdownCoordinator::DEFAULT_TIMEOUT)
        .await;
    Ok(())
}
