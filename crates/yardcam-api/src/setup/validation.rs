//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use yardcam_core::{Config, StorageBackend};

/// Validate critical configuration values
///
/// Fails on values that would make every request fail or weaken security; warns on values
/// that only degrade the service.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.is_production() && config.cors_origins().iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production. \
            Set specific allowed origins via the CORS_ORIGINS environment variable."
        ));
    }

    if config.storage_backend() == StorageBackend::Azure
        && config.azure_storage_connection_string().is_none()
    {
        tracing::warn!(
            "AZURE_STORAGE_CONNECTION_STRING is not set - uploads will fail with CONFIGURATION_ERROR"
        );
    }

    if config.is_production() && config.function_key().is_none() {
        tracing::warn!("FUNCTION_KEY is not set - the upload endpoint accepts anonymous requests");
    }

    if config.is_production() && config.storage_backend() == StorageBackend::Local {
        tracing::warn!("Local storage backend in production - images are not replicated");
    }

    Ok(())
}
