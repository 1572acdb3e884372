//! HNQ Game Server (hnq-gs) - Main entry point
//!
//! Serves the trending-story guessing game over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use hnq_common::config::{self, TomlConfig};
use hnq_common::events::EventBus;
use hnq_gs::acquire::{AcquisitionPipeline, HackerNewsClient};
use hnq_gs::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EVENT_BUS_CAPACITY: usize = 256;

/// Command-line arguments for hnq-gs
#[derive(Parser, Debug)]
#[command(name = "hnq-gs")]
#[command(about = "Hacker News score guessing game server")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "HNQ_PORT")]
    port: Option<u16>,

    /// Hacker News API base URL (overrides config file)
    #[arg(long, env = "HNQ_BASE_URL")]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = config::resolve_config_path(args.config.as_deref());
    let mut config: TomlConfig =
        config::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(base_url) = args.base_url {
        config.hacker_news.base_url = base_url;
    }
    config.validate().context("Invalid configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter_directive("hnq_gs").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HNQ game server on port {}", config.port);
    match &config_path {
        Some(path) if path.exists() => info!("Config file: {}", path.display()),
        _ => info!("Config file: none, using built-in defaults"),
    }
    info!(
        base_url = %config.hacker_news.base_url,
        feed = ?config.hacker_news.feed,
        game_items = config.game.item_limit.get(),
        browse_items = config.browse.item_limit.get(),
        "Upstream configured"
    );

    let client = HackerNewsClient::new(&config.hacker_news)
        .context("Failed to create Hacker News client")?;
    let pipeline = AcquisitionPipeline::new(Arc::new(client), config.hacker_news.max_in_flight);
    let events = Arc::new(EventBus::new(EVENT_BUS_CAPACITY));

    let state = AppState::new(
        pipeline,
        events,
        config.game.item_limit,
        config.browse.item_limit,
    );
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
