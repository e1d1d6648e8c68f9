//! HTTP client for the yardcam upload endpoint.
//!
//! Provides a minimal client with optional function-key auth, generic GET/POST helpers, and
//! the upload call used by the CLI.

pub mod api;

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use yardcam_core::constants::FUNCTION_KEY_HEADER;
use yardcam_core::models::ErrorResponse;

pub const DEFAULT_BASE_URL: &str = "http://localhost:7071";

/// Non-2xx answer from the API, decoded from its error body when possible.
#[derive(Debug, thiserror::Error)]
#[error("API request failed with status {status}: {code}: {message}")]
pub struct ApiError {
    pub status: u16,
    /// Machine-readable code such as `PAYLOAD_TOO_LARGE`; `UNKNOWN` when the body had none
    pub code: String,
    pub message: String,
    pub max_size_mb: Option<f64>,
    pub actual_size_mb: Option<f64>,
}

impl ApiError {
    fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(error) => Self {
                status,
                code: error.error,
                message: error.message,
                max_size_mb: error.max_size_mb,
                actual_size_mb: error.actual_size_mb,
            },
            Err(_) => Self {
                status,
                code: "UNKNOWN".to_string(),
                message: if body.is_empty() {
                    "Unknown error".to_string()
                } else {
                    body.to_string()
                },
                max_size_mb: None,
                actual_size_mb: None,
            },
        }
    }

    /// Whether sending the same request again may succeed.
    pub fn is_retryable(&self) -> bool {
        self.status >= 500 && self.code != "CONFIGURATION_ERROR"
    }
}

/// HTTP client for the upload API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    function_key: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String, function_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            function_key,
        })
    }

    /// Create client from environment: YARDCAM_API_URL (or API_URL) and, when the endpoint
    /// requires one, YARDCAM_FUNCTION_KEY (or FUNCTION_KEY).
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("YARDCAM_API_URL")
            .or_else(|_| std::env::var("API_URL"))
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let function_key = std::env::var("YARDCAM_FUNCTION_KEY")
            .or_else(|_| std::env::var("FUNCTION_KEY"))
            .ok()
            .filter(|k| !k.is_empty());

        Self::new(base_url, function_key)
    }

    /// Same client and key, different endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.function_key {
            Some(key) => request.header(FUNCTION_KEY_HEADER, key.as_str()),
            None => request,
        }
    }

    /// GET request. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.get(&url));

        let response = request.send().await.context("Failed to send request")?;
        Self::parse_response(response).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));

        let response = request.send().await.context("Failed to send request")?;
        Self::parse_response(response).await
    }

    async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::from_body(status.as_u16(), &error_text).into());
        }

        let body: T = response
            .json()
            .await
            .context("Failed to parse response as JSON")?;

        Ok(body)
    }

    /// Raw client for custom requests. Caller must apply auth via build_url and headers.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

// Re-export domain response types for convenience.
pub use api::HealthResponse;
pub use yardcam_core::models::{UploadImageRequest, UploadImageResponse};
