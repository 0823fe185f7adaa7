//! Inference over a pair of "today" / "tomorrow" uploads
//!
//! The service owns an immutable scaler and trained model, so one instance can
//! be shared across concurrent requests.

use crate::data::DataLoader;
use crate::error::{ForecastError, Result};
use crate::features::{assemble_serving, merge_uploads};
use crate::models::linear::TrainedLinearDemand;
use crate::models::{ModelInput, TrainedForecastModel};
use crate::scaler::ScalerState;
use crate::sequence::HOURS_PER_DAY;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Forecast for one row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_mean_per_hour: f64,
    pub predicted_day_total: f64,
}

impl Prediction {
    pub fn from_mean(mean: f64) -> Self {
        Self {
            predicted_mean_per_hour: mean,
            predicted_day_total: mean * HOURS_PER_DAY as f64,
        }
    }
}

/// Serving-side pipeline: assemble, scale, predict
#[derive(Debug)]
pub struct InferenceService {
    scaler: ScalerState,
    model: Box<dyn TrainedForecastModel>,
}

impl InferenceService {
    pub fn new(scaler: ScalerState, model: Box<dyn TrainedForecastModel>) -> Self {
        Self { scaler, model }
    }

    /// Load the scaler and model bundle written by the training job
    pub fn from_artifacts<P: AsRef<Path>, Q: AsRef<Path>>(
        scaler_path: P,
        model_dir: Q,
    ) -> Result<Self> {
        let scaler = ScalerState::load(scaler_path)?;
        let model = TrainedLinearDemand::load(model_dir)?;
        info!(model = model.name(), "inference service ready");
        Ok(Self::new(scaler, Box::new(model)))
    }

    pub fn scaler(&self) -> &ScalerState {
        &self.scaler
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Predict one row per aligned row of the two uploads
    pub fn predict(&self, today: &DataFrame, tomorrow: &DataFrame) -> Result<Vec<Prediction>> {
        let merged = merge_uploads(today, tomorrow)?;
        let batch = assemble_serving(&merged)?;
        let input = ModelInput::from_features(&batch.features, &self.scaler);
        debug!(
            rows = input.len(),
            defaulted = ?batch.defaulted,
            "assembled serving batch"
        );

        let means = self.model.predict(&input)?;
        if let Some(row) = means.iter().position(|m| !m.is_finite()) {
            return Err(ForecastError::ModelError(format!(
                "model produced a non-finite prediction at row {}",
                row
            )));
        }
        Ok(means.into_iter().map(Prediction::from_mean).collect())
    }

    /// Parse two CSV uploads and predict
    pub fn predict_csv(&self, today: &[u8], tomorrow: &[u8]) -> Result<Vec<Prediction>> {
        let today = DataLoader::read_upload(today)?;
        let tomorrow = DataLoader::read_upload(tomorrow)?;
        self.predict(&today, &tomorrow)
    }
}
