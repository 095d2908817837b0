//! HTTP endpoints: the chat stream, workflow control and result lookups.

use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio_stream::{Stream, StreamExt};
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeFile;
use tracing::info;

use super::coordinator::Coordinator;

/// Shared state for advisor routes.
#[derive(Clone)]
pub struct AdvisorRouteState {
    pub coordinator: Arc<Coordinator>,
}

/// Message returned by the reset endpoint.
pub const RESET_MESSAGE: &str =
    "Conversation has been reset. You can start a new financial planning session.";

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
}

/// One event per chunk; each line of the chunk becomes a `data:` line.
fn event_stream(
    chunks: ReceiverStream<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(chunks.map(|chunk| {
        let normalized = chunk.replace("\r\n", "\n").replace('\r', "\n");
        Ok(Event::default().data(normalized))
    }))
}

/// GET /chat
///
/// Bootstrap turn: no user message.
async fn chat_bootstrap(State(state): State<AdvisorRouteState>) -> impl IntoResponse {
    event_stream(state.coordinator.process_turn(None))
}

/// POST /chat
///
/// One workflow turn. An empty message counts as no message.
async fn chat(
    State(state): State<AdvisorRouteState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let message = request.message.filter(|m| !m.is_empty());
    event_stream(state.coordinator.process_turn(message))
}

/// GET /api/workflow/status
async fn workflow_status(State(state): State<AdvisorRouteState>) -> impl IntoResponse {
    Json(state.coordinator.status().await)
}

/// POST /api/workflow/reset
async fn workflow_reset(State(state): State<AdvisorRouteState>) -> impl IntoResponse {
    state.coordinator.reset().await;
    Json(serde_json::json!({
        "status": "reset_complete",
        "message": RESET_MESSAGE
    }))
}

/// GET /api/profile
///
/// Returns the extracted profile, or 404 if extraction hasn't run.
async fn get_profile(State(state): State<AdvisorRouteState>) -> impl IntoResponse {
    match state.coordinator.profile().await {
        Some(profile) => Json(profile).into_response(),
        None => not_found("No profile extracted yet"),
    }
}

/// GET /api/recommendations
async fn get_recommendations(State(state): State<AdvisorRouteState>) -> impl IntoResponse {
    match state.coordinator.recommendation().await {
        Some(result) => Json(result).into_response(),
        None => not_found("No recommendations generated yet"),
    }
}

fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "ai-advisor"
    }))
}

/// Build the advisor REST and streaming routes.
pub fn advisor_routes(state: AdvisorRouteState) -> Router {
    Router::new()
        .route("/chat", get(chat_bootstrap).post(chat))
        .route("/api/workflow/status", get(workflow_status))
        .route("/api/workflow/reset", post(workflow_reset))
        .route("/api/profile", get(get_profile))
        .route("/api/recommendations", get(get_recommendations))
        .route("/health", get(health))
        .with_state(state)
}

/// Full application: advisor routes, the chat page at `/`, permissive CORS.
pub fn app(coordinator: Arc<Coordinator>, static_dir: &Path) -> Router {
    let index = static_dir.join("index.html");
    info!(path = %index.display(), "Serving chat page");
    advisor_routes(AdvisorRouteState { coordinator })
        .route_service("/", ServeFile::new(index))
        .layer(CorsLayer::permissive())
}
