//! Shared pieces of the `yardcam` command-line client.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use yardcam_processing::{
    CaptureSession, CollectingListener, CompressedPhoto, CompressionSettings, FileCamera,
    JpegReencoder,
};

/// Run a full capture session against an image file and return the compressed photo.
///
/// The file stands in for the camera: permission is granted, the "capture" is the file, and
/// compression goes through the same encoder a device session would use.
pub async fn capture_photo(path: &Path, settings: CompressionSettings) -> Result<CompressedPhoto> {
    let mut session = CaptureSession::new(
        FileCamera::new(path),
        JpegReencoder,
        CollectingListener::default(),
        settings,
    )?;

    session.request_permission().await?;
    if !session.camera_ready() {
        anyhow::bail!("{} is not a readable image file", path.display());
    }

    session
        .capture()
        .await
        .with_context(|| format!("Failed to capture {}", path.display()))?;
    session
        .compress()
        .await
        .with_context(|| format!("Failed to compress {}", path.display()))?;

    let mut listener = session.into_listener();
    listener
        .take_photo()
        .context("Capture session finished without a photo")
}

/// Pretty-print a response as JSON on stdout.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join("yard.png");
        image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        })
        .save(&path)
        .unwrap();
        path
    }

    #[tokio::test]
    async fn captures_and_compresses_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 1600, 1200);

        let photo = capture_photo(&path, CompressionSettings::default())
            .await
            .unwrap();

        assert_eq!((photo.width(), photo.height()), (1024, 768));
        assert!(photo.to_data_uri().starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn custom_width_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 800, 400);

        let settings = CompressionSettings::new(200, 0.6).unwrap();
        let photo = capture_photo(&path, settings).await.unwrap();

        assert_eq!((photo.width(), photo.height()), (200, 100));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            capture_photo(&dir.path().join("nope.jpg"), CompressionSettings::default()).await;
        assert!(result.is_err());
    }
}
