use axum::body::Body;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use http::header::{CACHE_CONTROL, CONTENT_TYPE};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::ChatRequest;
use crate::services::relay_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ai/chat", post(chat))
}

/// POST /llm/ai/chat
/// Streams the inference backend's output lines back as they arrive
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, AppError> {
    info!("POST /llm/ai/chat - {} messages", request.messages.len());

    let lines = relay_service::relay_chat(state.inference.as_ref(), &request.messages)
        .await
        .map_err(|e| {
            error!("Chat relay could not start: {}", e);
            e
        })?;

    Ok((
        [(CONTENT_TYPE, "text/event-stream"), (CACHE_CONTROL, "no-cache")],
        Body::from_stream(lines),
    )
        .into_response())
}
