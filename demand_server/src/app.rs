//! Axum application builder

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::routes::{health, predict};
use crate::state::AppState;

/// CORS for the configured origin
///
/// Any method and header is mirrored back with credentials allowed. This is
/// meant for a development frontend; tighten it for production deployments.
pub fn cors_layer(config: &ServerConfig) -> Result<CorsLayer, ServerError> {
    let origin = HeaderValue::from_str(&config.allowed_origin)
        .map_err(|_| ServerError::InvalidOrigin(config.allowed_origin.clone()))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// Create the Axum application with all routes.
pub fn create_app(state: AppState, config: &ServerConfig) -> Result<Router, ServerError> {
    Ok(Router::new()
        .route("/health", get(health::health))
        .route("/predict", post(predict::predict))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config)?)
        .with_state(state))
}
