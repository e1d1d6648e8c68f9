use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// Liveness plus whether a blob store is configured. Never touches the store.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let storage = if state.storage_configured() {
        "configured"
    } else {
        "not_configured"
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "storage": storage,
        })),
    )
}
