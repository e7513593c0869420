//! UTM Server - airspace zone registry and point-in-airspace checks

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use utm_server::api;
use utm_server::config::{Config, LogFormat};
use utm_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    init_tracing(config.log_format)?;

    tracing::info!("Starting UTM Server...");
    if config.uses_dev_secret() {
        tracing::warn!("UTM_JWT_SECRET not set, using the development signing secret");
    }

    let port = config.server_port;
    let state = Arc::new(AppState::from_config(config).await?);
    let app = api::app(state);

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("utm_server=debug".parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
