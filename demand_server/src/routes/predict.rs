//! Prediction endpoint
//!
//! `POST /predict` takes a multipart form with two CSV tables:
//!
//! - `today_file`: one row per entity with `hours_sale_today`, the day's
//!   context columns and category ids
//! - `tomorrow_file`: context describing the forecast day, row-aligned with
//!   `today_file`

use axum::extract::{Multipart, State};
use axum::Json;
use demand_forecast::Prediction;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const TODAY_FIELD: &str = "today_file";
pub const TOMORROW_FIELD: &str = "tomorrow_file";

/// Prediction response.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// One forecast per uploaded row, in upload order
    pub rows: Vec<Prediction>,
}

/// `POST /predict`
pub async fn predict(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<PredictResponse>> {
    let mut today: Option<Vec<u8>> = None;
    let mut tomorrow: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        let slot = match name.as_str() {
            TODAY_FIELD => &mut today,
            TOMORROW_FIELD => &mut tomorrow,
            _ => continue,
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read {}: {}", name, e)))?;
        *slot = Some(data.to_vec());
    }

    let today = today.ok_or_else(|| ApiError::BadRequest(format!("missing {}", TODAY_FIELD)))?;
    let tomorrow =
        tomorrow.ok_or_else(|| ApiError::BadRequest(format!("missing {}", TOMORROW_FIELD)))?;

    let service = state.service.clone();
    let rows = tokio::task::spawn_blocking(move || service.predict_csv(&today, &tomorrow))
        .await
        .map_err(|e| ApiError::Internal(format!("prediction task failed: {}", e)))??;

    tracing::info!(rows = rows.len(), "served predictions");
    Ok(Json(PredictResponse { rows }))
}
