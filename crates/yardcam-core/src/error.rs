//! Error types module
//!
//! All endpoint failures are unified under [`AppError`]. Each variant describes its own HTTP
//! presentation through [`ErrorMetadata`] so handlers only ever return `Result<_, AppError>`.

use crate::constants::BYTES_PER_MEGABYTE;
use crate::models::bytes_to_megabytes;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for client errors worth noticing, like oversize payloads
    Warn,
    /// Error level - for server-side failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "MISSING_FIELDS")
    fn error_code(&self) -> &'static str;

    /// Whether the client may retry the same request unchanged
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details must be hidden from the client
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Missing required fields: {0}")]
    MissingFields(String),

    #[error("Invalid user identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid image encoding: {0}")]
    InvalidEncoding(String),

    #[error("Failed to decode image data: {0}")]
    DecodeFailed(String),

    #[error("Image too large: {actual_bytes} bytes exceeds max {max_bytes} bytes")]
    PayloadTooLarge { max_bytes: usize, actual_bytes: usize },

    #[error("Request body exceeds limit of {limit_bytes} bytes")]
    BodyLimitExceeded { limit_bytes: usize },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upload failed after {attempts} attempts: {last_error}")]
    UploadExhausted { attempts: u32, last_error: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedRequest(format!("Request body must be valid JSON: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, bool, LogLevel) {
    match err {
        AppError::MalformedRequest(_) => (400, "MALFORMED_REQUEST", false, false, LogLevel::Debug),
        AppError::MissingFields(_) => (400, "MISSING_FIELDS", false, false, LogLevel::Debug),
        AppError::InvalidIdentifier(_) => (400, "INVALID_USER_ID", false, false, LogLevel::Debug),
        AppError::InvalidEncoding(_) => (400, "INVALID_ENCODING", false, false, LogLevel::Debug),
        AppError::DecodeFailed(_) => (400, "DECODE_FAILED", false, false, LogLevel::Debug),
        AppError::PayloadTooLarge { .. } => (413, "PAYLOAD_TOO_LARGE", false, false, LogLevel::Warn),
        AppError::BodyLimitExceeded { .. } => {
            (413, "PAYLOAD_TOO_LARGE", false, false, LogLevel::Warn)
        }
        AppError::Unauthorized(_) => (401, "UNAUTHORIZED", false, false, LogLevel::Debug),
        AppError::Configuration(_) => (500, "CONFIGURATION_ERROR", false, true, LogLevel::Error),
        AppError::UploadExhausted { .. } => (500, "UPLOAD_FAILED", true, true, LogLevel::Error),
        AppError::Storage(_) => (500, "STORAGE_ERROR", false, true, LogLevel::Error),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, true, LogLevel::Error),
        AppError::InternalWithSource { .. } => (500, "INTERNAL_ERROR", true, true, LogLevel::Error),
    }
}

impl AppError {
    /// Get the error type name for logs
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::MalformedRequest(_) => "MalformedRequest",
            AppError::MissingFields(_) => "MissingFields",
            AppError::InvalidIdentifier(_) => "InvalidIdentifier",
            AppError::InvalidEncoding(_) => "InvalidEncoding",
            AppError::DecodeFailed(_) => "DecodeFailed",
            AppError::PayloadTooLarge { .. } => "PayloadTooLarge",
            AppError::BodyLimitExceeded { .. } => "BodyLimitExceeded",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Configuration(_) => "Configuration",
            AppError::UploadExhausted { .. } => "UploadExhausted",
            AppError::Storage(_) => "Storage",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Whether this error was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status_code())
    }

    /// Size limits attached to 413 responses as (maxSizeMB, actualSizeMB).
    pub fn size_limits_mb(&self) -> Option<(f64, Option<f64>)> {
        match self {
            AppError::PayloadTooLarge {
                max_bytes,
                actual_bytes,
            } => Some((
                bytes_to_megabytes(*max_bytes),
                Some(bytes_to_megabytes(*actual_bytes)),
            )),
            AppError::BodyLimitExceeded { limit_bytes } => {
                Some((bytes_to_megabytes(*limit_bytes), None))
            }
            _ => None,
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            AppError::MalformedRequest(ref msg) => msg.clone(),
            AppError::MissingFields(ref fields) => format!("Missing required fields: {}", fields),
            AppError::InvalidIdentifier(ref msg) => msg.clone(),
            AppError::InvalidEncoding(ref msg) => msg.clone(),
            AppError::DecodeFailed(ref msg) => msg.clone(),
            AppError::PayloadTooLarge { max_bytes, .. } => format!(
                "Image exceeds {}MB limit",
                max_bytes / BYTES_PER_MEGABYTE
            ),
            AppError::BodyLimitExceeded { limit_bytes } => format!(
                "Request body exceeds {}MB limit",
                limit_bytes / BYTES_PER_MEGABYTE
            ),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Configuration(_) => "Storage is not configured".to_string(),
            AppError::UploadExhausted { .. } => "Upload failed".to_string(),
            AppError::Storage(_) => "Upload failed".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}
