use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use yardcam_core::constants::{FUNCTION_KEY_HEADER, FUNCTION_KEY_QUERY_PARAM};
use yardcam_core::AppError;

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Key presented by the caller: the `x-functions-key` header wins over the `code` query
/// parameter.
fn presented_key(request: &Request) -> Option<String> {
    if let Some(header) = request
        .headers()
        .get(FUNCTION_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        return Some(header.to_string());
    }

    Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(mut params)| params.remove(FUNCTION_KEY_QUERY_PARAM))
}

/// Reject requests that do not present the configured function key.
///
/// Passes every request through when no key is configured.
pub async fn function_key_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.function_key() else {
        return next.run(request).await;
    };

    match presented_key(&request) {
        Some(key) if secure_compare(&key, expected) => next.run(request).await,
        Some(_) => {
            tracing::debug!(path = %request.uri().path(), "Function key mismatch");
            HttpAppError(AppError::Unauthorized("Invalid function key".to_string())).into_response()
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "Function key missing");
            HttpAppError(AppError::Unauthorized(
                "A function key is required to call this endpoint".to_string(),
            ))
            .into_response()
        }
    }
}
