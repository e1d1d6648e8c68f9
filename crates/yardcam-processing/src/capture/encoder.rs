use super::camera::CapturedPhoto;
use crate::compression::{CompressedPhoto, CompressionSettings, ImageCompressor};
use crate::error::{CaptureError, CaptureResult};
use async_trait::async_trait;

/// Re-encodes a captured photo
#[async_trait]
pub trait PhotoEncoder: Send + Sync {
    async fn reencode(
        &self,
        photo: &CapturedPhoto,
        settings: &CompressionSettings,
    ) -> CaptureResult<CompressedPhoto>;
}

/// Default encoder: [`ImageCompressor`] on the blocking thread pool
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegReencoder;

#[async_trait]
impl PhotoEncoder for JpegReencoder {
    async fn reencode(
        &self,
        photo: &CapturedPhoto,
        settings: &CompressionSettings,
    ) -> CaptureResult<CompressedPhoto> {
        let data = photo
            .read_bytes()
            .await
            .map_err(|e| CaptureError::CompressionFailed(format!("cannot read capture: {}", e)))?;
        let settings = *settings;

        tokio::task::spawn_blocking(move || ImageCompressor::compress(&data, &settings))
            .await
            .map_err(|e| CaptureError::CompressionFailed(format!("compression task failed: {}", e)))?
    }
}
