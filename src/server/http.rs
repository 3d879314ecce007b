use crate::config::Config;
use crate::error::RelayError;
use crate::relay::Relay;
use crate::types::{PromptRequest, RelayResponse};
use anyhow::Result;
use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    response::Json,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// HTTP server state, built once before serving
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay: Arc<Relay>,
}

/// Routes plus middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Prompt relay
        .route("/api/prompt", post(prompt_handler))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start HTTP server, returns after Ctrl-C
pub async fn serve(state: AppState) -> Result<()> {
    let bind = state.config.bind_addr();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("✓ HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let upstream_ok = state.relay.provider().health().await.unwrap_or(false);

    Json(json!({
        "status": if upstream_ok { "healthy" } else { "degraded" },
        "version": crate::VERSION,
        "provider": state.relay.provider().name(),
        "model": state.relay.model(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// POST /api/prompt
#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn prompt_handler(
    State(state): State<AppState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<RelayResponse>, RelayError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!("Rejected request body: {}", rejection.body_text());
        RelayError::InvalidInput(rejection.body_text())
    })?;

    let text = state.relay.relay(&payload.prompt).await?;

    Ok(Json(RelayResponse::ok(text)))
}
