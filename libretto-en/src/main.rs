//! libretto-en - Recommendation Ensemble Microservice
//!
//! Fans a user playlist out to independently hosted scoring services,
//! normalizes and weights their similarity scores, merges duplicates by
//! ISBN, and serves one ranked recommendation list.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use libretto_en::config::ServiceConfig;
use libretto_en::AppState;

#[derive(Debug, Parser)]
#[command(name = "libretto-en", about = "Libretto recommendation ensemble service")]
struct Args {
    /// Config file path (overrides LIBRETTO_CONFIG and the default path)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP listen port (overrides LIBRETTO_EN_PORT and the config file)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Starting libretto-en (Recommendation Ensemble) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = ServiceConfig::resolve(args.config.as_deref(), args.port)?;
    info!(
        port = config.port,
        source_count = config.sources.len(),
        "Configuration resolved"
    );

    let state = AppState::new(config.clone())?;
    let app = libretto_en::build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await?;
    info!("Listening on http://127.0.0.1:{}", config.port);
    info!("Health check: http://127.0.0.1:{}/health", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install ctrl-c handler");
    }
}
