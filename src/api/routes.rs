//! Router setup and shared state.
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::api::handlers;
use crate::tools::{ToolContext, ToolRegistry};

pub struct AppState {
    pub registry: ToolRegistry,
    pub context: ToolContext,
}

/// Build the HTTP router. Stored images under `static_dir` are served at `/static`.
pub fn router(state: Arc<AppState>, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/tools", get(handlers::list_tools))
        .route("/tools/:name", post(handlers::invoke_tool))
        .route("/ratio", get(handlers::ratio))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
