//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p yardcam-api --test upload_image_test`.

#![allow(dead_code)]

pub mod fixtures;
pub mod storage;

use axum_test::TestServer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;
use yardcam_api::setup::routes;
use yardcam_api::state::AppState;
use yardcam_core::{Config, UploadServiceConfig};
use yardcam_storage::BlobStore;

pub use storage::{Failure, FlakyBlobStore};

pub const BYTES_PER_MEGABYTE: usize = 1024 * 1024;

/// Test application: server plus the store behind it.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// Default configuration with the upload limits and retry policy of a deployment.
pub fn test_config() -> UploadServiceConfig {
    UploadServiceConfig::default()
}

/// App backed by `store`; `None` simulates a missing storage credential.
pub fn setup_test_app(store: Option<Arc<dyn BlobStore>>) -> TestApp {
    setup_test_app_with_config(test_config(), store)
}

pub fn setup_test_app_with_config(
    config: UploadServiceConfig,
    store: Option<Arc<dyn BlobStore>>,
) -> TestApp {
    let state = Arc::new(AppState::new(Config(Box::new(config)), store));
    let router = routes::setup_routes(&state.config, state.clone())
        .expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    TestApp { server, state }
}

/// Counts tracing events that carry an `attempt` field, i.e. retry attempt log entries.
#[derive(Clone, Default)]
pub struct AttemptCounter(Arc<AtomicUsize>);

impl AttemptCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

struct HasAttempt(bool);

impl Visit for HasAttempt {
    fn record_debug(&mut self, field: &Field, _value: &dyn std::fmt::Debug) {
        if field.name() == "attempt" {
            self.0 = true;
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for AttemptCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = HasAttempt(false);
        event.record(&mut visitor);
        if visitor.0 {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}
