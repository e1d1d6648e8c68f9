//! Configuration module
//!
//! Configuration is read once at process start (`Config::from_env`) and injected into the
//! request handlers. Nothing reads the environment per request.

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::constants::{BYTES_PER_MEGABYTE, DEFAULT_CONTAINER_NAME};
use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 7071;
const MAX_IMAGE_SIZE_MB: usize = 10;
const MAX_REQUEST_BODY_MB: usize = 32;
const UPLOAD_MAX_ATTEMPTS: u32 = 3;
const UPLOAD_BACKOFF_BASE_MS: u64 = 1000;

/// Console log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Server-level configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub log_format: LogFormat,
    /// Function-level auth token; `None` disables the check
    pub function_key: Option<String>,
}

/// Upload endpoint configuration
#[derive(Clone, Debug)]
pub struct UploadServiceConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub azure_storage_connection_string: Option<String>,
    pub container_name: String,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Upload limits
    pub max_image_size_bytes: usize,
    pub max_request_body_bytes: usize,
    // Retry policy
    pub upload_max_attempts: u32,
    pub upload_backoff_base_ms: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<UploadServiceConfig>);

impl Config {
    fn as_upload(&self) -> &UploadServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.as_upload().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = UploadServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_upload().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.as_upload().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_upload().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_upload().base.environment
    }

    pub fn log_format(&self) -> LogFormat {
        self.as_upload().base.log_format
    }

    pub fn function_key(&self) -> Option<&str> {
        self.as_upload().base.function_key.as_deref()
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_upload().storage_backend
    }

    pub fn azure_storage_connection_string(&self) -> Option<&str> {
        self.as_upload().azure_storage_connection_string.as_deref()
    }

    pub fn container_name(&self) -> &str {
        &self.as_upload().container_name
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_upload().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_upload().local_storage_base_url.as_deref()
    }

    pub fn max_image_size_bytes(&self) -> usize {
        self.as_upload().max_image_size_bytes
    }

    pub fn max_request_body_bytes(&self) -> usize {
        self.as_upload().max_request_body_bytes
    }

    pub fn upload_max_attempts(&self) -> u32 {
        self.as_upload().upload_max_attempts
    }

    pub fn upload_backoff_base_ms(&self) -> u64 {
        self.as_upload().upload_backoff_base_ms
    }
}

impl Default for UploadServiceConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig {
                server_port: SERVER_PORT,
                cors_origins: vec!["*".to_string()],
                environment: "development".to_string(),
                log_format: LogFormat::Compact,
                function_key: None,
            },
            storage_backend: StorageBackend::Azure,
            azure_storage_connection_string: None,
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            local_storage_path: None,
            local_storage_base_url: None,
            max_image_size_bytes: MAX_IMAGE_SIZE_MB * BYTES_PER_MEGABYTE,
            max_request_body_bytes: MAX_REQUEST_BODY_MB * BYTES_PER_MEGABYTE,
            upload_max_attempts: UPLOAD_MAX_ATTEMPTS,
            upload_backoff_base_ms: UPLOAD_BACKOFF_BASE_MS,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a numeric setting, using `default` only when the variable is unset.
fn parse_setting<T>(key: &str, value: Option<String>, default: T) -> Result<T, anyhow::Error>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} must be a valid number ({}): {}", key, raw, e)),
        None => Ok(default),
    }
}

fn megabytes_to_bytes(key: &str, megabytes: usize) -> Result<usize, anyhow::Error> {
    megabytes
        .checked_mul(BYTES_PER_MEGABYTE)
        .ok_or_else(|| anyhow::anyhow!("{} is too large ({} MB)", key, megabytes))
}

impl UploadServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let log_format = match env::var("LOG_FORMAT") {
            Ok(value) => value.parse()?,
            Err(_) => LogFormat::Compact,
        };

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            log_format,
            function_key: non_empty_var("FUNCTION_KEY"),
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::Azure,
        };

        let max_image_size_mb = parse_setting(
            "MAX_IMAGE_SIZE_MB",
            non_empty_var("MAX_IMAGE_SIZE_MB"),
            MAX_IMAGE_SIZE_MB,
        )?;
        let max_request_body_mb = parse_setting(
            "MAX_REQUEST_BODY_MB",
            non_empty_var("MAX_REQUEST_BODY_MB"),
            MAX_REQUEST_BODY_MB,
        )?;

        let config = UploadServiceConfig {
            base,
            storage_backend,
            azure_storage_connection_string: non_empty_var("AZURE_STORAGE_CONNECTION_STRING"),
            container_name: non_empty_var("UPLOAD_CONTAINER")
                .unwrap_or_else(|| DEFAULT_CONTAINER_NAME.to_string()),
            local_storage_path: non_empty_var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: non_empty_var("LOCAL_STORAGE_BASE_URL"),
            max_image_size_bytes: megabytes_to_bytes("MAX_IMAGE_SIZE_MB", max_image_size_mb)?,
            max_request_body_bytes: megabytes_to_bytes("MAX_REQUEST_BODY_MB", max_request_body_mb)?,
            upload_max_attempts: parse_setting(
                "UPLOAD_MAX_ATTEMPTS",
                non_empty_var("UPLOAD_MAX_ATTEMPTS"),
                UPLOAD_MAX_ATTEMPTS,
            )?,
            upload_backoff_base_ms: parse_setting(
                "UPLOAD_BACKOFF_BASE_MS",
                non_empty_var("UPLOAD_BACKOFF_BASE_MS"),
                UPLOAD_BACKOFF_BASE_MS,
            )?,
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_image_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_IMAGE_SIZE_MB must be greater than 0"));
        }
        // base64 inflates payloads by 4/3, so the body limit must leave room for a max-size image
        let min_body = self.max_image_size_bytes.div_ceil(3) * 4;
        if self.max_request_body_bytes < min_body {
            return Err(anyhow::anyhow!(
                "MAX_REQUEST_BODY_MB ({} bytes) is too small for base64 images of MAX_IMAGE_SIZE_MB ({} bytes)",
                self.max_request_body_bytes,
                self.max_image_size_bytes
            ));
        }
        if self.upload_max_attempts == 0 {
            return Err(anyhow::anyhow!("UPLOAD_MAX_ATTEMPTS must be at least 1"));
        }
        if self.container_name.trim().is_empty() {
            return Err(anyhow::anyhow!("UPLOAD_CONTAINER must not be empty"));
        }
        if self.storage_backend == StorageBackend::Local
            && (self.local_storage_path.is_none() || self.local_storage_base_url.is_none())
        {
            return Err(anyhow::anyhow!(
                "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when STORAGE_BACKEND=local"
            ));
        }
        Ok(())
    }
}
