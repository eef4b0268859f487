use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/inference", get(inference_health))
}

async fn health() -> &'static str {
    info!("GET /health - Health check");
    "OK"
}

/// GET /health/inference
/// Whether the inference backend answers its readiness probe
async fn inference_health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    info!("GET /health/inference - Inference readiness check");

    if state.inference.is_ready().await {
        (StatusCode::OK, Json(json!({ "inference_backend": "ready" })))
    } else {
        warn!("Inference backend is not ready");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "inference_backend": "unavailable" })),
        )
    }
}
