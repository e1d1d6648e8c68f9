use crate::error::{CaptureError, CaptureResult};
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageReader};
use std::io::Cursor;
use yardcam_core::constants::JPEG_DATA_URI_PREFIX;

pub const DEFAULT_MAX_WIDTH: u32 = 1024;
pub const DEFAULT_QUALITY: f32 = 0.8;

/// Target size and quality for captured photos
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionSettings {
    /// Output width ceiling in pixels; narrower images keep their size
    pub max_width: u32,
    /// JPEG quality in `(0, 1]`
    pub quality: f32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl CompressionSettings {
    pub fn new(max_width: u32, quality: f32) -> CaptureResult<Self> {
        let settings = Self {
            max_width,
            quality,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> CaptureResult<()> {
        if self.max_width == 0 {
            return Err(CaptureError::InvalidSettings(
                "max_width must be greater than 0".to_string(),
            ));
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(CaptureError::InvalidSettings(format!(
                "quality must be in (0, 1], got {}",
                self.quality
            )));
        }
        Ok(())
    }

    /// Quality on the encoder's 1-100 scale
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// JPEG produced by compression. Always JPEG, never wider than the settings allowed.
#[derive(Clone, PartialEq, Eq)]
pub struct CompressedPhoto {
    data: Bytes,
    width: u32,
    height: u32,
}

impl std::fmt::Debug for CompressedPhoto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressedPhoto")
            .field("size_bytes", &self.data.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl CompressedPhoto {
    pub fn new(data: Bytes, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Standard base64 of the JPEG bytes, without a data URI prefix
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.data)
    }

    /// `data:image/jpeg;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        format!("{}{}", JPEG_DATA_URI_PREFIX, self.to_base64())
    }
}

/// Resizes and re-encodes captured photos as JPEG
pub struct ImageCompressor;

impl ImageCompressor {
    /// Dimensions after fitting `width` under `max_width`, preserving aspect ratio.
    /// Never upscales.
    pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
        if width <= max_width {
            return (width, height);
        }
        let scaled = (height as u64 * max_width as u64 + width as u64 / 2) / width as u64;
        (max_width, (scaled as u32).max(1))
    }

    /// Decode `data` (any supported format), apply its EXIF orientation, shrink it to the
    /// maximum width and encode it as JPEG.
    pub fn compress(data: &[u8], settings: &CompressionSettings) -> CaptureResult<CompressedPhoto> {
        settings.validate()?;

        if data.is_empty() {
            return Err(CaptureError::CompressionFailed(
                "captured photo is empty".to_string(),
            ));
        }

        let mut decoder = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| CaptureError::CompressionFailed(e.to_string()))?
            .into_decoder()
            .map_err(|e| CaptureError::CompressionFailed(e.to_string()))?;
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let mut img = DynamicImage::from_decoder(decoder)
            .map_err(|e| CaptureError::CompressionFailed(e.to_string()))?;
        img.apply_orientation(orientation);

        let (width, height) = img.dimensions();
        let (target_width, target_height) =
            Self::target_dimensions(width, height, settings.max_width);

        if target_width < width {
            img = img.resize_exact(target_width, target_height, FilterType::Lanczos3);
        }

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

        let mut output = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(
            &mut output,
            settings.jpeg_quality(),
        ))
        .map_err(|e| CaptureError::CompressionFailed(e.to_string()))?;

        if output.is_empty() {
            return Err(CaptureError::CompressionFailed(
                "encoder produced no output".to_string(),
            ));
        }

        tracing::debug!(
            original_width = width,
            original_height = height,
            width = target_width,
            height = target_height,
            quality = settings.jpeg_quality(),
            input_bytes = data.len(),
            output_bytes = output.len(),
            "Photo compressed"
        );

        Ok(CompressedPhoto::new(
            Bytes::from(output),
            target_width,
            target_height,
        ))
    }
}
