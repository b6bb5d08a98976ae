//! ytt-query - read-only HTTP service over the trending analytics store
//!
//! Serves rankings, drill-downs, tag trends and search as JSON. The store is
//! built by ytt-pipeline; this service never writes to it.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ytt_common::config::{
    ConfigOverrides, Settings, ENV_CONFIG_FILE, ENV_REGION, ENV_ROOT_FOLDER, ENV_STORE_PATH,
};
use ytt_query::{build_router, AppState};

/// Command-line arguments for ytt-query
#[derive(Parser, Debug)]
#[command(name = "ytt-query")]
#[command(about = "Serve the trending analytics store over HTTP")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = ENV_CONFIG_FILE)]
    config: Option<PathBuf>,

    /// Root folder holding raw/ and processed/
    #[arg(short, long, env = ENV_ROOT_FOLDER)]
    root_folder: Option<PathBuf>,

    /// Analytical store file
    #[arg(long, env = ENV_STORE_PATH)]
    store: Option<PathBuf>,

    /// Region the store was built for
    #[arg(long, env = ENV_REGION)]
    region: Option<String>,

    /// HTTP port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = ConfigOverrides {
        config_file: args.config.clone(),
        root_folder: args.root_folder.clone(),
        store_path: args.store.clone(),
        region: args.region.clone(),
        http_port: args.port,
        ..Default::default()
    };
    let settings = Settings::resolve(&overrides).context("Failed to resolve configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting ytt-query v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Store: {}", settings.store_path.display());
    info!("Region: {}", settings.region);

    let pool = ytt_query::db::connect_readonly(&settings.store_path)
        .await
        .context("Failed to open store")?;

    let app = build_router(AppState::new(pool.clone(), settings.region.clone()));

    let addr = format!("{}:{}", settings.http_bind, settings.http_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("ytt-query listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
