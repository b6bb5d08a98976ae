//! ytt-pipeline - batch rebuild of the trending analytical store
//!
//! Reads the trending export, validates it, derives every analytical table
//! and swaps the new table set into the store. Prints the QA report when
//! done; exits non-zero when the source is unavailable or the store write
//! fails.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ytt_common::config::{
    ConfigOverrides, Settings, SharePopulation, ENV_CONFIG_FILE, ENV_REGION, ENV_ROOT_FOLDER,
    ENV_SHARE_POPULATION, ENV_SOURCE_CSV, ENV_STORE_PATH, ENV_THREADS,
};
use ytt_pipeline::{run_pipeline, PipelineOptions};

/// Command-line arguments for ytt-pipeline
#[derive(Parser, Debug)]
#[command(name = "ytt-pipeline")]
#[command(about = "Rebuild the trending analytics store from the CSV export")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = ENV_CONFIG_FILE)]
    config: Option<PathBuf>,

    /// Root folder holding raw/ and processed/
    #[arg(short, long, env = ENV_ROOT_FOLDER)]
    root_folder: Option<PathBuf>,

    /// Source CSV export
    #[arg(short, long, env = ENV_SOURCE_CSV)]
    source: Option<PathBuf>,

    /// Analytical store file
    #[arg(long, env = ENV_STORE_PATH)]
    store: Option<PathBuf>,

    /// Region the stickiness, channel and tag tables are scoped to
    #[arg(long, env = ENV_REGION)]
    region: Option<String>,

    /// Worker threads for the CPU stages
    #[arg(short, long, env = ENV_THREADS)]
    threads: Option<usize>,

    /// Denominator for video_share: "tagged" or "all"
    #[arg(long, env = ENV_SHARE_POPULATION)]
    share_population: Option<SharePopulation>,

    /// Also write the run report as JSON to this path
    #[arg(long)]
    report_json: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = ConfigOverrides {
        config_file: args.config.clone(),
        root_folder: args.root_folder.clone(),
        source_csv: args.source.clone(),
        store_path: args.store.clone(),
        region: args.region.clone(),
        threads: args.threads,
        share_population: args.share_population,
        http_port: None,
    };
    let settings = Settings::resolve(&overrides).context("Failed to resolve configuration")?;

    // Initialize tracing (RUST_LOG wins over the configured level)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting ytt-pipeline v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Root folder: {}", settings.root_folder.display());
    info!("Source: {}", settings.source_csv.display());
    info!("Store: {}", settings.store_path.display());

    let options = PipelineOptions::from(&settings);
    let report = run_pipeline(&options)
        .await
        .context("Pipeline run failed")?;

    for line in report.display_lines() {
        println!("{}", line);
    }

    if let Some(path) = &args.report_json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize run report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write run report to {}", path.display()))?;
        info!("Run report written to {}", path.display());
    }

    Ok(())
}
