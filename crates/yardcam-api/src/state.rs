use std::sync::Arc;
use std::time::Duration;

use yardcam_core::Config;
use yardcam_infra::RetryPolicy;
use yardcam_storage::BlobStore;

/// Shared, immutable state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// `None` when no storage credential is configured; uploads then fail with a
    /// configuration error instead of the server refusing to start.
    pub storage: Option<Arc<dyn BlobStore>>,
    pub retry_policy: RetryPolicy,
}

impl AppState {
    pub fn new(config: Config, storage: Option<Arc<dyn BlobStore>>) -> Self {
        let retry_policy = RetryPolicy::new(
            config.upload_max_attempts(),
            Duration::from_millis(config.upload_backoff_base_ms()),
        );
        Self {
            config: Arc::new(config),
            storage,
            retry_policy,
        }
    }

    pub fn storage_configured(&self) -> bool {
        self.storage.is_some()
    }
}
