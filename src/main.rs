use anyhow::Context;
use casting_agency::router::init_router;
use casting_agency::state::init_app_state;
use casting_config::ServerConfig;
use dotenvy::dotenv;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    casting_observability::init_tracing();

    let state = init_app_state().context("Failed to load configuration")?;
    let metrics = casting_observability::init_metrics()
        .context("Failed to install Prometheus recorder")?;

    if state.auth_config.jwks_prefetch {
        match state.auth.keys().refresh().await {
            Ok(snapshot) => info!(keys = snapshot.len(), "Signing key cache warmed"),
            Err(e) => warn!(error = %e, "Signing key prefetch failed; keys load on first request"),
        }
    }

    let server_config = ServerConfig::from_env();
    let app = init_router(state, metrics);

    let listener = tokio::net::TcpListener::bind(server_config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", server_config.bind_addr()))?;
    info!("🚀 Server running on http://{}", server_config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
