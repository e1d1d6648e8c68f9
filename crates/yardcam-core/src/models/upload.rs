use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::BYTES_PER_MEGABYTE;

/// Body of `POST /UploadImage`.
///
/// The endpoint parses requests field by field so that each validation step can report its own
/// error; this type is what well-behaved clients send.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageRequest {
    /// Base64 image payload, optionally prefixed with `data:image/<type>;base64,`
    pub image_data: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// Descriptor of a stored image, returned with status 200.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageResponse {
    pub image_url: String,
    /// Blob name without its `.jpg` extension
    pub image_id: String,
    pub uploaded_at: DateTime<Utc>,
    pub size_bytes: usize,
    #[serde(rename = "sizeMB")]
    pub size_mb: f64,
}

/// Error body returned for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,
    pub message: String,
    #[serde(rename = "maxSizeMB", default, skip_serializing_if = "Option::is_none")]
    pub max_size_mb: Option<f64>,
    #[serde(rename = "actualSizeMB", default, skip_serializing_if = "Option::is_none")]
    pub actual_size_mb: Option<f64>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            max_size_mb: None,
            actual_size_mb: None,
        }
    }
}

/// Convert a byte count to mebibytes rounded to two decimals.
pub fn bytes_to_megabytes(bytes: usize) -> f64 {
    let mb = bytes as f64 / BYTES_PER_MEGABYTE as f64;
    (mb * 100.0).round() / 100.0
}
