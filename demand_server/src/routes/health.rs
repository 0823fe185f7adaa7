//! Health check endpoint

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Name of the loaded model
    pub model: String,
    /// Feature names the loaded scaler was fitted on
    pub features: Vec<String>,
    /// Number of vectors the scaler was fitted on
    pub scaler_samples: usize,
    pub uptime_secs: u64,
}

/// Liveness probe: `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let scaler = state.service.scaler();
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        model: state.service.model_name().to_string(),
        features: scaler.feature_names().to_vec(),
        scaler_samples: scaler.n_samples(),
        uptime_secs: state.uptime_secs(),
    })
}
