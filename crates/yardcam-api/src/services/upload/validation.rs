//! Request validation
//!
//! Each step is a standalone function and the first failure short-circuits, so the order here
//! decides which error a request with several problems gets. Nothing in this module touches
//! storage.

use super::types::ValidatedUpload;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use yardcam_core::AppError;

const IMAGE_DATA_FIELD: &str = "imageData";
const USER_ID_FIELD: &str = "userId";
const FILE_NAME_FIELD: &str = "fileName";

static BASE64_PAYLOAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+/]+={0,2}$").expect("valid base64 pattern"));

static IMAGE_DATA_URI_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:image/[A-Za-z0-9.+-]+;base64,").expect("valid data URI pattern")
});

/// Run every validation step over a raw request body.
pub fn validate_upload(body: &[u8], max_image_bytes: usize) -> Result<ValidatedUpload, AppError> {
    let fields = parse_body(body)?;
    let (image_data, user_id) = require_fields(&fields)?;
    let user_id = validate_user_id(user_id)?;
    let payload = normalize_image_data(image_data)?;
    let data = decode_image(payload)?;
    enforce_size_limit(data.len(), max_image_bytes)?;

    Ok(ValidatedUpload {
        user_id,
        file_name: file_name(&fields),
        data: Bytes::from(data),
    })
}

/// Step 1: the body is a JSON object.
pub fn parse_body(body: &[u8]) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(fields) => Ok(fields),
        other => Err(AppError::MalformedRequest(format!(
            "Request body must be a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

/// Step 2: `imageData` and `userId` are present and not null. An empty `imageData` string
/// counts as missing.
pub fn require_fields(fields: &Map<String, Value>) -> Result<(&Value, &Value), AppError> {
    let image_data = fields
        .get(IMAGE_DATA_FIELD)
        .filter(|v| !v.is_null() && v.as_str() != Some(""));
    let user_id = fields.get(USER_ID_FIELD).filter(|v| !v.is_null());

    match (image_data, user_id) {
        (Some(image_data), Some(user_id)) => Ok((image_data, user_id)),
        (image_data, user_id) => {
            let missing: Vec<&str> = [
                image_data.is_none().then_some(IMAGE_DATA_FIELD),
                user_id.is_none().then_some(USER_ID_FIELD),
            ]
            .into_iter()
            .flatten()
            .collect();
            Err(AppError::MissingFields(missing.join(", ")))
        }
    }
}

/// Step 3: `userId` is a string with something other than whitespace in it.
pub fn validate_user_id(value: &Value) -> Result<String, AppError> {
    let Some(user_id) = value.as_str() else {
        return Err(AppError::InvalidIdentifier(format!(
            "userId must be a string, got {}",
            json_type_name(value)
        )));
    };

    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidIdentifier(
            "userId must not be blank".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Step 4: `imageData` is a string of base64 alphabet characters, once surrounding
/// whitespace and any `data:image/<subtype>;base64,` prefix are removed.
pub fn normalize_image_data(value: &Value) -> Result<&str, AppError> {
    let Some(raw) = value.as_str() else {
        return Err(AppError::InvalidEncoding(format!(
            "imageData must be a base64 string, got {}",
            json_type_name(value)
        )));
    };

    let trimmed = raw.trim();
    let payload = match IMAGE_DATA_URI_PREFIX.find(trimmed) {
        Some(prefix) => &trimmed[prefix.end()..],
        None => trimmed,
    };

    if !BASE64_PAYLOAD.is_match(payload) {
        return Err(AppError::InvalidEncoding(
            "imageData is not valid base64".to_string(),
        ));
    }
    Ok(payload)
}

/// Step 5: the payload decodes under the standard (padded) alphabet.
pub fn decode_image(payload: &str) -> Result<Vec<u8>, AppError> {
    general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| AppError::DecodeFailed(format!("imageData could not be decoded: {}", e)))
}

/// Step 6: the decoded image fits under the configured ceiling.
pub fn enforce_size_limit(actual_bytes: usize, max_bytes: usize) -> Result<(), AppError> {
    if actual_bytes > max_bytes {
        return Err(AppError::PayloadTooLarge {
            max_bytes,
            actual_bytes,
        });
    }
    Ok(())
}

/// Optional `fileName`. Blank or non-string values are treated as absent.
fn file_name(fields: &Map<String, Value>) -> Option<String> {
    match fields.get(FILE_NAME_FIELD) {
        Some(Value::String(name)) if !name.trim().is_empty() => Some(name.trim().to_string()),
        Some(Value::Null) | None => None,
        Some(other) => {
            tracing::debug!(
                field_type = json_type_name(other),
                "Ignoring non-string fileName"
            );
            None
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use yardcam_core::ErrorMetadata;

    const MAX: usize = 10 * 1024 * 1024;

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn error_code(result: Result<ValidatedUpload, AppError>) -> &'static str {
        result.unwrap_err().error_code()
    }

    #[test]
    fn accepts_plain_and_prefixed_payloads() {
        let plain = validate_upload(
            &body(json!({"imageData": "/9j/4AAQ", "userId": " user_42 "})),
            MAX,
        )
        .unwrap();
        assert_eq!(plain.user_id, "user_42");
        assert_eq!(&plain.data[..3], &[0xFF, 0xD8, 0xFF]);
        assert_eq!(plain.file_name, None);

        let prefixed = validate_upload(
            &body(json!({
                "imageData": "data:image/jpeg;base64,/9j/4AAQ",
                "userId": "user_42",
                "fileName": "front-yard.jpg"
            })),
            MAX,
        )
        .unwrap();
        assert_eq!(prefixed.data, plain.data);
        assert_eq!(prefixed.file_name.as_deref(), Some("front-yard.jpg"));
    }

    #[test]
    fn malformed_json_is_rejected_first() {
        assert_eq!(error_code(validate_upload(b"{not json", MAX)), "MALFORMED_REQUEST");
        assert_eq!(error_code(validate_upload(b"[1, 2]", MAX)), "MALFORMED_REQUEST");
    }

    #[test]
    fn missing_fields_are_listed() {
        let err = validate_upload(&body(json!({})), MAX).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_FIELDS");
        assert!(err.client_message().contains("imageData, userId"));

        let err = validate_upload(&body(json!({"imageData": "", "userId": "u"})), MAX)
            .unwrap_err();
        assert_eq!(err.error_code(), "MISSING_FIELDS");
        assert!(err.client_message().contains("imageData"));

        assert_eq!(
            error_code(validate_upload(
                &body(json!({"imageData": "AAAA", "userId": null})),
                MAX
            )),
            "MISSING_FIELDS"
        );
    }

    #[test]
    fn blank_or_non_string_user_id_is_invalid() {
        for user_id in [json!("   "), json!(""), json!(42)] {
            assert_eq!(
                error_code(validate_upload(
                    &body(json!({"imageData": "AAAA", "userId": user_id})),
                    MAX
                )),
                "INVALID_USER_ID"
            );
        }
    }

    #[test]
    fn user_id_is_checked_before_image_data() {
        assert_eq!(
            error_code(validate_upload(
                &body(json!({"imageData": "not base64!", "userId": " "})),
                MAX
            )),
            "INVALID_USER_ID"
        );
    }

    #[test]
    fn non_base64_is_an_encoding_error() {
        for image_data in [
            json!("not base64!"),
            json!("data:image/jpeg;base64,"),
            json!("data:text/plain;base64,AAAA"),
            json!("AA AA"),
            json!(12345),
        ] {
            assert_eq!(
                error_code(validate_upload(
                    &body(json!({"imageData": image_data, "userId": "u"})),
                    MAX
                )),
                "INVALID_ENCODING",
            );
        }
    }

    #[test]
    fn undecodable_base64_is_a_decode_error() {
        assert_eq!(
            error_code(validate_upload(
                &body(json!({"imageData": "AAA", "userId": "u"})),
                MAX
            )),
            "DECODE_FAILED"
        );
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(enforce_size_limit(MAX, MAX).is_ok());
        assert!(matches!(
            enforce_size_limit(MAX + 1, MAX),
            Err(AppError::PayloadTooLarge {
                max_bytes: MAX,
                actual_bytes
            }) if actual_bytes == MAX + 1
        ));
    }

    #[test]
    fn blank_or_non_string_file_name_is_ignored() {
        for file_name in [json!("   "), json!(7), json!(null)] {
            let upload = validate_upload(
                &body(json!({"imageData": "AAAA", "userId": "u", "fileName": file_name})),
                MAX,
            )
            .unwrap();
            assert_eq!(upload.file_name, None);
        }
    }
}
