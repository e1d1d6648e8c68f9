//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Every failure renders as the
//! shared [`ErrorResponse`] body with the status and code its [`AppError`] variant declares.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use yardcam_core::models::ErrorResponse;
use yardcam_core::{AppError, ErrorMetadata, LogLevel};
use yardcam_storage::StorageError;

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from yardcam-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(AppError::Storage(err.to_string()))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error,
                error_type = error_type,
                details = %error.detailed_message(),
                "Error occurred"
            );
        }
    }
}

/// Build the response body for `error`.
///
/// Sensitive errors only expose their generic client message; the detail goes to the log.
pub fn error_body(error: &AppError) -> ErrorResponse {
    let mut body = ErrorResponse::new(error.error_code(), error.client_message());
    if let Some((max_size_mb, actual_size_mb)) = error.size_limits_mb() {
        body.max_size_mb = Some(max_size_mb);
        body.actual_size_mb = actual_size_mb;
    }
    body
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        (status, Json(error_body(app_error))).into_response()
    }
}
