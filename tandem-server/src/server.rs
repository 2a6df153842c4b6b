use crate::{RelayConfig, RoomRegistry, SignalingRelay, ws_handler};
use anyhow::Context;
use axum::Router;
use axum::routing::get;
use tandem_core::Result;
use tandem_core::utils::SIGNALING_PATH;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(relay: SignalingRelay, config: &RelayConfig) -> Result<Router> {
    let cors = config.cors_layer()?;

    Ok(Router::new()
        .route(SIGNALING_PATH, get(ws_handler))
        .route("/health", get(health))
        .layer(cors)
        .with_state(relay))
}

async fn health() -> &'static str {
    "ok"
}

/// Binds `config.socket_addr()` and serves until the process exits.
pub async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    serve_on(listener, config).await
}

pub async fn serve_on(listener: TcpListener, config: RelayConfig) -> anyhow::Result<()> {
    let relay = SignalingRelay::new(RoomRegistry::new(), config.ice_servers.clone());
    let app = router(relay, &config)?;

    info!(
        "Signaling relay listening on ws://{}{}",
        listener.local_addr()?,
        SIGNALING_PATH
    );
    axum::serve(listener, app)
        .await
        .context("Signaling relay stopped")?;
    Ok(())
}
