use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mentor_app_server::{ServerConfig, run_main};
use mentor_embeddings::EmbeddingProvider;
use mentor_retrieval::EmbeddingService;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Embedding generation and similarity search over stdio.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, env = "MENTOR_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = ServerConfig::resolve_path(cli.config.as_deref());
    let config = ServerConfig::load(config_path.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &config_path {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    let provider = config.provider.build_provider();
    if !provider.is_available() {
        warn!("No API key configured; embedding requests will fail");
    }

    let service = EmbeddingService::builder(Arc::new(provider))
        .with_config(config.retrieval)
        .build()
        .await
        .context("failed to open document store")?;

    info!("Starting mentor-app-server v{}", env!("CARGO_PKG_VERSION"));
    run_main(Arc::new(service)).await?;

    // A pending stdin read cannot be cancelled and would block runtime shutdown.
    std::process::exit(0)
}
