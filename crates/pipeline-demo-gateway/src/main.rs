//! pipeline-demo gateway
//!
//! - `GET /`        welcome document
//! - `GET /health`  liveness + uptime
//! - `GET /metrics` Prometheus scrape
//!
//! Config: optional YAML at `$PIPELINE_CONFIG`, port override via `$PORT`.

use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

use pipeline_demo_core::error::{PipelineError, Result};
use pipeline_demo_gateway::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        tracing::error!(code = e.code().as_str(), error = %e, "fatal");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cfg = config::load_from_env()?;
    let listen = cfg.server.listen_addr()?;

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    let listener = TcpListener::bind(listen)
        .await
        .map_err(|e| PipelineError::Internal(format!("bind {listen} failed: {e}")))?;
    tracing::info!(%listen, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| PipelineError::Internal(format!("server failed: {e}")))?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
