//! Types passed between the upload pipeline's stages

use bytes::Bytes;
use chrono::{DateTime, Utc};
use yardcam_core::models::{bytes_to_megabytes, UploadImageResponse};

/// Request that passed every validation step
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    /// Trimmed, non-empty user identifier
    pub user_id: String,
    /// Caller-supplied name, trimmed; `None` when absent or blank
    pub file_name: Option<String>,
    /// Decoded image bytes, within the size limit
    pub data: Bytes,
}

/// Blob written by the upload service
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub blob_name: String,
    pub image_id: String,
    pub url: String,
    pub size_bytes: usize,
    pub uploaded_at: DateTime<Utc>,
}

impl From<StoredImage> for UploadImageResponse {
    fn from(stored: StoredImage) -> Self {
        UploadImageResponse {
            image_url: stored.url,
            image_id: stored.image_id,
            uploaded_at: stored.uploaded_at,
            size_bytes: stored.size_bytes,
            size_mb: bytes_to_megabytes(stored.size_bytes),
        }
    }
}
