//! HTTP service serving next-day demand forecasts.
//!
//! Loads the scaler and model bundle produced by the `train` job once at
//! startup and answers `POST /predict` with one forecast per uploaded row.
//!
//! # Modules
//!
//! - [`app`]: router, CORS and tracing middleware
//! - [`config`]: environment configuration
//! - [`state`]: shared, read-only inference service
//! - [`error`]: HTTP error mapping
//! - [`routes`]: handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use app::create_app;
pub use config::ServerConfig;
pub use error::{ApiError, ServerError};
pub use state::AppState;
