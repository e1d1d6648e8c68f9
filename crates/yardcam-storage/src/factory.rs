#[cfg(feature = "storage-azure")]
use crate::AzureBlobStorage;
#[cfg(feature = "storage-local")]
use crate::LocalStorage;
use crate::{BlobStore, StorageBackend, StorageError, StorageResult};
use std::sync::Arc;
use yardcam_core::Config;

/// Create a blob store based on configuration
///
/// Returns `Ok(None)` when the Azure backend is selected but no connection string is set. The
/// server still starts in that case and upload requests fail with a configuration error.
pub async fn create_storage(config: &Config) -> StorageResult<Option<Arc<dyn BlobStore>>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-azure")]
        StorageBackend::Azure => {
            let Some(connection_string) = config.azure_storage_connection_string() else {
                tracing::warn!(
                    "AZURE_STORAGE_CONNECTION_STRING not configured; uploads will be rejected"
                );
                return Ok(None);
            };

            let storage = AzureBlobStorage::from_connection_string(connection_string)?;
            Ok(Some(Arc::new(storage)))
        }

        #[cfg(not(feature = "storage-azure"))]
        StorageBackend::Azure => Err(StorageError::ConfigError(
            "Azure storage backend not available (storage-azure feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
                })?;

            let storage = LocalStorage::new(base_path, base_url).await?;
            Ok(Some(Arc::new(storage)))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
