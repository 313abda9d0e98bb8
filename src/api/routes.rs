//! HTTP routes for the browser page.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::state::AppState;
use super::types::{AskRequest, AskResponse, HealthResponse};

/// Build the router over shared state.
///
/// CORS is permissive: during development the page is often served from a
/// different origin than this API.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/ask", post(ask))
        .route("/api/result", get(latest_result))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST /api/ask - run one question through the agent.
///
/// Always answers 200: the page drives its error banner, answer panel and
/// weather panel from the body fields, not from status codes.
async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Json<AskResponse> {
    let generation = state.results.begin().await;

    let response = AskResponse::from(state.agent.ask(&request.query).await);
    if let Some(error) = &response.error {
        warn!("Question failed: {}", error);
    }

    if !state.results.commit(generation, response.clone()).await {
        info!("Discarding result of superseded submission {}", generation);
    }

    Json(response)
}

/// GET /api/result - the latest committed result, for page re-renders.
async fn latest_result(State(state): State<Arc<AppState>>) -> Json<AskResponse> {
    Json(state.results.latest().await.unwrap_or_default())
}

/// GET /api/health - liveness check.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
