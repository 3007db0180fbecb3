//! HTTP routes for the proof gateway

use std::time::Instant;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use basealias_core::proto::{AnchorHead, GatewayRequest, GatewayResponse};

use crate::error::{Result, ServerError};
use crate::metrics;
use crate::state::SharedState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub block: Option<u64>,
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let state = state.read().await;
    let block = state.backend().head().await.ok().map(|head| head.block);
    Json(HealthResponse {
        status: if block.is_some() { "ready" } else { "degraded" }.to_string(),
        backend: state.backend().describe().to_string(),
        block,
    })
}

/// Current head commitment
async fn anchor(State(state): State<SharedState>) -> Result<Json<AnchorHead>> {
    let state = state.read().await;
    Ok(Json(state.anchor_head().await?))
}

/// Answer a proof request
async fn proof(
    State(state): State<SharedState>,
    Json(request): Json<GatewayRequest>,
) -> Result<Json<GatewayResponse>> {
    let start = Instant::now();
    let state = state.read().await;
    let result = state.answer(&request).await;
    let outcome = match &result {
        Ok(_) => metrics::OUTCOME_OK,
        Err(ServerError::InvalidQuery(_)) | Err(ServerError::Json(_)) => {
            metrics::OUTCOME_CLIENT_ERROR
        }
        Err(_) => metrics::OUTCOME_SERVER_ERROR,
    };
    metrics::record_proof_request(outcome, start.elapsed());
    result.map(Json)
}

/// Prometheus exposition
async fn metrics_text(State(state): State<SharedState>) -> String {
    state.read().await.render_metrics().unwrap_or_default()
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/anchor", get(anchor))
        .route("/proof", post(proof))
        .route("/metrics", get(metrics_text))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
