//! Test fixtures: JPEG-shaped payloads and request bodies.

use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};

/// JPEG-shaped blob of exactly `len` bytes: SOI marker, filler, EOI marker.
pub fn jpeg_bytes(len: usize) -> Vec<u8> {
    assert!(len >= 4);
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.extend((0..len - 6).map(|i| (i % 251) as u8));
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

/// A 50 KB photo (51 200 bytes)
pub fn fifty_kb_jpeg() -> Vec<u8> {
    jpeg_bytes(50 * 1024)
}

pub fn base64(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

pub fn data_uri(data: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", base64(data))
}

pub fn upload_body(image_data: &str, user_id: &str) -> Value {
    json!({
        "imageData": image_data,
        "userId": user_id,
    })
}

pub fn upload_body_with_name(image_data: &str, user_id: &str, file_name: &str) -> Value {
    json!({
        "imageData": image_data,
        "userId": user_id,
        "fileName": file_name,
    })
}
