use std::sync::Arc;

use anyhow::Context;
use mission_control::actors::RateGovernor;
use mission_control::api::{self, ApiState};
use mission_control::app_state::AppState;
use mission_control::config::{load_env_file, MissionConfig};
use mission_control::gateway::HttpInferenceGateway;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env_file();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mission_control=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MissionConfig::load().context("Failed to load mission control config")?;
    tracing::info!(
        ai_service = %config.service.base_url,
        call_timeout_ms = config.service.call_timeout_ms,
        key_mode = ?config.dispatch.key_mode,
        "Starting Mission Control"
    );

    let (governor, governor_handle) = RateGovernor::spawn(config.governor.arguments())
        .await
        .context("Failed to start rate governor")?;
    tracing::info!("RateGovernorActor started");

    let gateway = HttpInferenceGateway::new(config.service.base_url.clone())
        .context("Failed to build AI service client")?;

    let bind = config.server.bind.clone();
    let app_state = Arc::new(AppState::new(config, governor.clone(), Arc::new(gateway)));
    let app = api::router().with_state(ApiState { app_state });

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!("Starting HTTP server on http://{bind}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Shutting down");
    governor.actor().stop(None);
    let _ = governor_handle.await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
