//! Route configuration and setup

use crate::auth::function_key_middleware;
use crate::constants::{API_UPLOAD_IMAGE_PATH, HEALTH_PATH, UPLOAD_IMAGE_PATH};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use yardcam_core::Config;
use yardcam_infra::request_id_middleware;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    // Public routes (no authentication required)
    let public_routes = Router::new().route(HEALTH_PATH, get(handlers::health::health_check));

    // Upload routes require the function key when one is configured
    let upload_routes = Router::new()
        .route(UPLOAD_IMAGE_PATH, post(handlers::upload_image::upload_image))
        .route(API_UPLOAD_IMAGE_PATH, post(handlers::upload_image::upload_image))
        .layer(DefaultBodyLimit::max(config.max_request_body_bytes()))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            function_key_middleware,
        ));

    let app = public_routes
        .merge(upload_routes)
        .layer(
            ServiceBuilder::new()
                // Outermost: every response, including CORS preflights and auth failures,
                // carries X-Request-ID
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    Ok(app)
}

/// Setup CORS layer based on configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use yardcam_core::{BaseConfig, UploadServiceConfig};

    #[test]
    fn invalid_cors_origin_is_an_error() {
        let defaults = UploadServiceConfig::default();
        let config = Config(Box::new(UploadServiceConfig {
            base: BaseConfig {
                cors_origins: vec!["https://ok.example.com".into(), "bad\norigin".into()],
                ..defaults.base.clone()
            },
            ..defaults
        }));
        assert!(setup_cors(&config).is_err());
    }
}
