//! Upload service
//!
//! Persists a validated upload: ensure the container exists, then write the blob under the
//! retry policy. Only transient storage errors are retried.

use std::sync::Arc;

use chrono::Utc;
use yardcam_core::constants::{JPEG_CONTENT_TYPE, USER_ID_METADATA_KEY};
use yardcam_core::{AppError, PublicAccess};
use yardcam_infra::{retry_with_backoff, RetryError, RetryPolicy};
use yardcam_storage::{BlobMetadata, BlobStore, ContainerStatus, StorageError};

use super::naming;
use super::types::{StoredImage, ValidatedUpload};
use crate::state::AppState;

pub struct ImageUploadService {
    storage: Arc<dyn BlobStore>,
    container: String,
    retry_policy: RetryPolicy,
}

impl ImageUploadService {
    pub fn new(
        storage: Arc<dyn BlobStore>,
        container: impl Into<String>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            storage,
            container: container.into(),
            retry_policy,
        }
    }

    /// Build the service from application state, failing when no store is configured.
    pub fn from_state(state: &AppState) -> Result<Self, AppError> {
        let storage = state.storage.clone().ok_or_else(|| {
            AppError::Configuration(
                "Blob storage is not configured (set AZURE_STORAGE_CONNECTION_STRING)".to_string(),
            )
        })?;
        Ok(Self::new(
            storage,
            state.config.container_name(),
            state.retry_policy,
        ))
    }

    /// Store `upload` and describe the resulting blob.
    pub async fn store(&self, upload: ValidatedUpload) -> Result<StoredImage, AppError> {
        self.ensure_container().await?;

        let uploaded_at = Utc::now();
        let blob_name =
            naming::blob_name(&upload.user_id, upload.file_name.as_deref(), uploaded_at);
        let size_bytes = upload.data.len();

        let mut metadata = BlobMetadata::new();
        metadata.insert(USER_ID_METADATA_KEY.to_string(), upload.user_id.clone());

        tracing::debug!(
            container = %self.container,
            blob_name = %blob_name,
            size_bytes = size_bytes,
            "Uploading image"
        );

        let storage = &self.storage;
        let container = self.container.as_str();
        let key = blob_name.as_str();
        let metadata = &metadata;
        let data = &upload.data;
        let url = retry_with_backoff(
            &self.retry_policy,
            "put_blob",
            StorageError::is_transient,
            move |_attempt| {
                storage.put_blob(container, key, data.clone(), JPEG_CONTENT_TYPE, metadata)
            },
        )
        .await
        .map_err(upload_error)?;

        tracing::info!(
            container = %self.container,
            blob_name = %blob_name,
            size_bytes = size_bytes,
            url = %url,
            "Image uploaded"
        );

        Ok(StoredImage {
            image_id: naming::image_id(&blob_name).to_string(),
            blob_name,
            url,
            size_bytes,
            uploaded_at,
        })
    }

    async fn ensure_container(&self) -> Result<(), AppError> {
        match self
            .storage
            .ensure_container(&self.container, PublicAccess::Blob)
            .await
        {
            Ok(ContainerStatus::Created) => {
                tracing::info!(container = %self.container, "Container created");
                Ok(())
            }
            Ok(ContainerStatus::AlreadyExists) => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to ensure container '{}': {}",
                self.container, e
            ))),
        }
    }
}

fn upload_error(err: RetryError<StorageError>) -> AppError {
    match err {
        RetryError::Exhausted {
            attempts,
            last_error,
        } => AppError::UploadExhausted {
            attempts,
            last_error: last_error.to_string(),
        },
        RetryError::Aborted { attempt, error } => AppError::Storage(format!(
            "Upload rejected on attempt {}: {}",
            attempt, error
        )),
    }
}
