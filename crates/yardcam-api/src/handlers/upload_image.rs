use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    Extension, Json,
};
use yardcam_core::models::UploadImageResponse;
use yardcam_core::AppError;
use yardcam_infra::RequestId;

use crate::error::HttpAppError;
use crate::services::upload::{validate_upload, ImageUploadService};
use crate::state::AppState;

/// Upload image handler
///
/// Takes the raw body so that validation controls the order in which problems are reported:
/// malformed JSON, missing fields, user id, encoding, decoding, then size. Storage is only
/// touched once every check has passed.
///
/// # Errors
/// - 400 `MALFORMED_REQUEST`, `MISSING_FIELDS`, `INVALID_USER_ID`, `INVALID_ENCODING`,
///   `DECODE_FAILED`
/// - 413 `PAYLOAD_TOO_LARGE`
/// - 500 `CONFIGURATION_ERROR` when no store is configured, `UPLOAD_FAILED` once retries are
///   used up, `STORAGE_ERROR` for failures retrying cannot fix
#[tracing::instrument(
    skip(state, request_id, body),
    fields(request_id = tracing::field::Empty, user_id = tracing::field::Empty)
)]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    request_id: Option<Extension<RequestId>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<UploadImageResponse>, HttpAppError> {
    let span = tracing::Span::current();
    if let Some(Extension(RequestId(id))) = &request_id {
        span.record("request_id", id.as_str());
    }

    let body = body.map_err(|rejection| body_rejection(rejection, &state))?;
    tracing::info!(body_bytes = body.len(), "Upload request received");

    let upload = validate_upload(&body, state.config.max_image_size_bytes())?;
    span.record("user_id", upload.user_id.as_str());

    let service = ImageUploadService::from_state(&state)?;
    let stored = service.store(upload).await?;

    Ok(Json(stored.into()))
}

fn body_rejection(rejection: BytesRejection, state: &AppState) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::BodyLimitExceeded {
            limit_bytes: state.config.max_request_body_bytes(),
        }
    } else {
        AppError::MalformedRequest(format!("Failed to read request body: {}", rejection))
    }
}
