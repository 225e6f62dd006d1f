use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vview_backend_lib::{config::Settings, viewing::NoopViewingRequests, ws_router, AppState};

/// Virtual-viewing signaling server
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Settings::load_from(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    // The viewing-request CRUD layer is an external collaborator; until it
    // is wired up, completions are logged and acknowledged.
    let state = AppState::new(config.clone(), Arc::new(NoopViewingRequests));

    let app = ws_router::create_router(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
