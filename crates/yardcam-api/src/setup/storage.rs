//! Storage setup and initialization

use anyhow::Result;
use std::sync::Arc;
use yardcam_core::Config;
use yardcam_storage::{create_storage, BlobStore};

/// Create the configured blob store.
///
/// Returns `None` when the Azure backend has no connection string; the server still starts and
/// reports the problem per request.
pub async fn setup_storage(config: &Config) -> Result<Option<Arc<dyn BlobStore>>> {
    tracing::info!("Initializing storage abstraction...");
    let storage = create_storage(config).await?;

    match &storage {
        Some(store) => tracing::info!(
            backend = %store.backend_type(),
            container = %config.container_name(),
            "Storage abstraction initialized successfully"
        ),
        None => tracing::warn!(
            backend = %config.storage_backend(),
            "Storage not configured; upload requests will be rejected"
        ),
    }

    Ok(storage)
}
