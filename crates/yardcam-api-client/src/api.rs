//! Domain methods for the upload API client.

use crate::ApiClient;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use yardcam_core::models::{UploadImageRequest, UploadImageResponse};

pub const UPLOAD_IMAGE_PATH: &str = "/UploadImage";
pub const HEALTH_PATH: &str = "/health";

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
}

impl ApiClient {
    /// Upload an image given as base64, with or without a `data:image/...;base64,` prefix.
    pub async fn upload_image(
        &self,
        image_data: String,
        user_id: &str,
        file_name: Option<&str>,
    ) -> Result<UploadImageResponse> {
        let request = UploadImageRequest {
            image_data,
            user_id: user_id.to_string(),
            file_name: file_name.map(String::from),
        };

        tracing::debug!(
            url = %self.build_url(UPLOAD_IMAGE_PATH),
            payload_chars = request.image_data.len(),
            "Uploading image"
        );

        let response: UploadImageResponse = self.post_json(UPLOAD_IMAGE_PATH, &request).await?;

        tracing::info!(
            image_id = %response.image_id,
            size_bytes = response.size_bytes,
            "Image uploaded"
        );
        Ok(response)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.get(HEALTH_PATH).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApiError;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn upload_posts_camel_case_body_with_function_key() {
        let app = Router::new().route(
            UPLOAD_IMAGE_PATH,
            post(|headers: axum::http::HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["x-functions-key"], "k3y");
                assert_eq!(body["userId"], "user_42");
                assert_eq!(body["fileName"], "patio");
                assert_eq!(body["imageData"], "data:image/jpeg;base64,/9j/2Q==");
                Json(json!({
                    "imageUrl": "https://acct.blob.core.windows.net/yard-images/patio.jpg",
                    "imageId": "patio",
                    "uploadedAt": chrono::Utc::now(),
                    "sizeBytes": 4,
                    "sizeMB": 0.0
                }))
            }),
        );
        let client = ApiClient::new(spawn_server(app).await, Some("k3y".to_string())).unwrap();

        let response = client
            .upload_image(
                "data:image/jpeg;base64,/9j/2Q==".to_string(),
                "user_42",
                Some("patio"),
            )
            .await
            .unwrap();

        assert_eq!(response.image_id, "patio");
        assert_eq!(response.size_bytes, 4);
    }

    #[tokio::test]
    async fn error_responses_become_api_errors() {
        let app = Router::new().route(
            UPLOAD_IMAGE_PATH,
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "INVALID_USER_ID", "message": "userId must not be blank"})),
                )
            }),
        );
        let client = ApiClient::new(spawn_server(app).await, None).unwrap();

        let err = client
            .upload_image("AAAA".to_string(), " ", None)
            .await
            .unwrap_err();
        let api_error = err.downcast_ref::<ApiError>().expect("typed API error");

        assert_eq!(api_error.status, 400);
        assert_eq!(api_error.code, "INVALID_USER_ID");
    }
}
