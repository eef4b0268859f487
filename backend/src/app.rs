use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{crypto, health, llm};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/crypto", crypto::router())
        .nest("/llm", llm::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
