//! HateX — binary entrypoint.
//! Loads `.env`, reads the environment config and serves the Axum router.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use hatex::{app, telemetry, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();
    telemetry::init_tracing(config.debug);

    // The model artifact is declared but never loaded; predictions are heuristic.
    info!(model_path = %config.model_path.display(), "heuristic mode, model file not loaded");
    if config.debug {
        warn!("debug mode on: 500 responses include stack traces");
    }

    let router = app(&config)?;
    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, debug = config.debug, "HateX listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
