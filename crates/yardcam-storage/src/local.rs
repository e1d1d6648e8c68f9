use crate::keys::{validate_blob_name, validate_container_name};
use crate::traits::{BlobMetadata, BlobStore, ContainerStatus, StorageError, StorageResult};
use crate::{PublicAccess, StorageBackend};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Local filesystem storage implementation
///
/// Each container is a directory under `base_path`; blobs are files inside it.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for blob storage (e.g., "/var/lib/yardcam/blobs")
    /// * `base_url` - Base URL for serving blobs (e.g., "http://localhost:7071/blobs")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    fn container_path(&self, container: &str) -> StorageResult<PathBuf> {
        validate_container_name(container)?;
        Ok(self.base_path.join(container))
    }

    /// Convert container and key to a filesystem path with security validation
    fn blob_path(&self, container: &str, key: &str) -> StorageResult<PathBuf> {
        validate_blob_name(key)?;
        let path = self.container_path(container)?.join(key);

        if path.strip_prefix(&self.base_path).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    /// Generate public URL for a blob
    fn generate_url(&self, container: &str, key: &str) -> String {
        format!("{}/{}/{}", self.base_url.trim_end_matches('/'), container, key)
    }
}

#[async_trait]
impl BlobStore for LocalStorage {
    async fn ensure_container(
        &self,
        container: &str,
        _access: PublicAccess,
    ) -> StorageResult<ContainerStatus> {
        let path = self.container_path(container)?;

        if fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(ContainerStatus::AlreadyExists);
        }

        // create_dir_all succeeds when a concurrent caller created the directory first
        fs::create_dir_all(&path).await.map_err(|e| {
            StorageError::ContainerFailed(format!(
                "Failed to create container directory {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!(container = %container, path = %path.display(), "Local container created");
        Ok(ContainerStatus::Created)
    }

    async fn put_blob(
        &self,
        container: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: &BlobMetadata,
    ) -> StorageResult<String> {
        let path = self.blob_path(container, key)?;
        let size = data.len();
        let start = std::time::Instant::now();

        // Write to a unique temp file and rename so readers never observe a partial blob
        let temp_path = path.with_file_name(format!("{}.{}.part", key, Uuid::new_v4()));

        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", temp_path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", temp_path.display(), e))
        })?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to move {} into place: {}",
                path.display(),
                e
            )));
        }

        let url = self.generate_url(container, key);

        tracing::info!(
            path = %path.display(),
            container = %container,
            key = %key,
            content_type = %content_type,
            metadata = ?metadata,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
