//! Blob names for uploaded images

use chrono::{DateTime, Utc};
use uuid::Uuid;
use yardcam_core::constants::JPEG_EXTENSION;

const MAX_FILENAME_LENGTH: usize = 255;

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Sanitized caller-supplied name ending in `.jpg` exactly once.
pub fn sanitize_file_name(file_name: &str) -> String {
    let sanitized: String = sanitize_component(file_name.trim())
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .collect();

    if sanitized.ends_with(JPEG_EXTENSION) {
        sanitized
    } else {
        format!("{}{}", sanitized, JPEG_EXTENSION)
    }
}

/// `<sanitized userId>_<epochMillis>_<uuid v4>.jpg`
pub fn synthesize_file_name(user_id: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}{}",
        sanitize_component(user_id),
        now.timestamp_millis(),
        Uuid::new_v4(),
        JPEG_EXTENSION
    )
}

/// Blob name for an upload: the supplied name when there is one, a synthesized one otherwise.
///
/// A supplied name with nothing before the extension (`.jpg`) counts as absent.
pub fn blob_name(user_id: &str, file_name: Option<&str>, now: DateTime<Utc>) -> String {
    file_name
        .filter(|name| !name.trim().is_empty())
        .map(sanitize_file_name)
        .filter(|name| !image_id(name).is_empty())
        .unwrap_or_else(|| synthesize_file_name(user_id, now))
}

/// Identifier returned to the caller: the blob name without its trailing `.jpg`.
pub fn image_id(blob_name: &str) -> &str {
    blob_name.strip_suffix(JPEG_EXTENSION).unwrap_or(blob_name)
}
