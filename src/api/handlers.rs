//! Axum request handlers for the HTTP API.
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::routes::AppState;
use crate::error::AppError;
use crate::ratio::select_closest_ratio;
use crate::tools::{ToolCall, ToolOutput};

pub async fn root() -> &'static str {
    "Prodia Tools"
}

pub async fn list_tools(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(Value::Array(state.registry.schemas()))
}

pub async fn invoke_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(call): Json<ToolCall>,
) -> Result<Json<ToolOutput>, AppError> {
    state.registry
        .invoke(&name, &call, &state.context)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Tool {} failed: {}", name, e);
            e
        })
}

#[derive(Debug, Deserialize)]
pub struct RatioQuery {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

pub async fn ratio(Query(q): Query<RatioQuery>) -> &'static str {
    select_closest_ratio(q.width, q.height)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidParams(_) => StatusCode::BAD_REQUEST,
            AppError::UnknownTool(_) => StatusCode::NOT_FOUND,
            AppError::Tool { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
