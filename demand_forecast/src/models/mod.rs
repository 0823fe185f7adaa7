//! Forecast models
//!
//! Models see three aligned branches per row, mirroring the assembled
//! features: category ids `(n, 3)`, scaled numeric features `(n, 12)` and the
//! hourly sequence `(n, 24, 1)`. [`ModelInput::from_features`] is the single
//! place these tensors are built, for training and for serving alike.

use crate::error::{ForecastError, Result};
use crate::features::{AssembledFeatures, FEATURE_NAMES, NUM_CATEGORIES, NUM_FEATURES};
use crate::metrics::EvaluationMetrics;
use crate::scaler::ScalerState;
use crate::sequence::HOURS_PER_DAY;
use chrono::{DateTime, Utc};
use ndarray::{s, Array2, Array3};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs;
use std::path::Path;
use tracing::info;

pub mod linear;

/// File holding the bundle manifest
pub const MANIFEST_FILE: &str = "manifest.json";

/// File holding the model weights
pub const WEIGHTS_FILE: &str = "model.json";

/// Batched model input
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    /// Raw category ids, `(n, 3)`
    pub cat: Array2<f64>,
    /// Scaled numeric features, `(n, 12)`
    pub num: Array2<f64>,
    /// Hourly sales, `(n, 24, 1)`
    pub hours: Array3<f64>,
}

impl ModelInput {
    /// Vectorize assembled rows, scaling the numeric branch with `scaler`
    pub fn from_features(features: &[AssembledFeatures], scaler: &ScalerState) -> Self {
        let n = features.len();
        let mut cat = Array2::zeros((n, NUM_CATEGORIES));
        let mut num = Array2::zeros((n, NUM_FEATURES));
        let mut hours = Array3::zeros((n, HOURS_PER_DAY, 1));

        for (row, feature) in features.iter().enumerate() {
            for (col, value) in feature.categories.values().iter().enumerate() {
                cat[[row, col]] = *value;
            }
            let scaled = scaler.apply(&feature.numeric);
            for (col, value) in scaled.values().iter().enumerate() {
                num[[row, col]] = *value;
            }
            hours
                .slice_mut(s![row, .., ..])
                .assign(&feature.hours.to_tensor());
        }

        Self { cat, num, hours }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.num.nrows()
    }

    /// Whether the batch has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check the three branches agree on row count and width
    pub fn validate(&self) -> Result<()> {
        let n = self.len();
        if self.cat.dim() != (n, NUM_CATEGORIES)
            || self.num.dim() != (n, NUM_FEATURES)
            || self.hours.dim() != (n, HOURS_PER_DAY, 1)
        {
            return Err(ForecastError::ModelError(format!(
                "inconsistent input shapes: cat {:?}, num {:?}, hours {:?}",
                self.cat.dim(),
                self.num.dim(),
                self.hours.dim()
            )));
        }
        Ok(())
    }
}

/// Metrics recorded after one training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: usize,
    pub train: EvaluationMetrics,
    pub validation: Option<EvaluationMetrics>,
}

/// Per-epoch training curve
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochRecord>,
}

impl TrainingHistory {
    /// Last recorded epoch
    pub fn last(&self) -> Option<&EpochRecord> {
        self.epochs.last()
    }

    /// Write the history as JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Write one row per epoch with train and validation metrics
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "epoch",
            "loss",
            "mae",
            "mape",
            "accuracy",
            "val_loss",
            "val_mae",
            "val_mape",
            "val_accuracy",
        ])?;
        for record in &self.epochs {
            let mut row = vec![
                record.epoch.to_string(),
                record.train.mse.to_string(),
                record.train.mae.to_string(),
                record.train.mape.to_string(),
                record.train.accuracy.to_string(),
            ];
            match &record.validation {
                Some(val) => row.extend([
                    val.mse.to_string(),
                    val.mae.to_string(),
                    val.mape.to_string(),
                    val.accuracy.to_string(),
                ]),
                None => row.extend(std::iter::repeat(String::new()).take(4)),
            }
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug + Send + Sync {
    /// Predict next-day mean hourly sales for every row
    fn predict(&self, input: &ModelInput) -> Result<Vec<f64>>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on vectorized examples
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train against `targets` with MSE loss, scoring `validation` after each epoch
    fn train(
        &self,
        input: &ModelInput,
        targets: &[f64],
        validation: Option<(&ModelInput, &[f64])>,
    ) -> Result<(Self::Trained, TrainingHistory)>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Describes a saved model bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub model: String,
    pub feature_names: Vec<String>,
    pub sequence_len: usize,
    pub created_at: DateTime<Utc>,
}

/// Save weights and a manifest into `dir`
pub fn save_bundle<T: Serialize>(dir: &Path, model_name: &str, weights: &T) -> Result<()> {
    fs::create_dir_all(dir)?;
    let manifest = BundleManifest {
        model: model_name.to_string(),
        feature_names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
        sequence_len: HOURS_PER_DAY,
        created_at: Utc::now(),
    };
    fs::write(
        dir.join(MANIFEST_FILE),
        serde_json::to_string_pretty(&manifest)?,
    )?;
    fs::write(dir.join(WEIGHTS_FILE), serde_json::to_string(weights)?)?;
    info!(dir = %dir.display(), model = model_name, "saved model bundle");
    Ok(())
}

/// Load weights from `dir`, checking the manifest matches this feature layout
pub fn load_bundle<T: DeserializeOwned>(dir: &Path, model_name: &str) -> Result<T> {
    let manifest: BundleManifest =
        serde_json::from_str(&fs::read_to_string(dir.join(MANIFEST_FILE))?)?;

    if manifest.model != model_name {
        return Err(ForecastError::ArtifactMismatch(format!(
            "bundle holds a '{}' model, expected '{}'",
            manifest.model, model_name
        )));
    }
    if manifest.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES)
        || manifest.sequence_len != HOURS_PER_DAY
    {
        return Err(ForecastError::ArtifactMismatch(format!(
            "bundle was trained on features {:?} with sequence length {}",
            manifest.feature_names, manifest.sequence_len
        )));
    }

    let weights = serde_json::from_str(&fs::read_to_string(dir.join(WEIGHTS_FILE))?)?;
    info!(dir = %dir.display(), model = model_name, created_at = %manifest.created_at, "loaded model bundle");
    Ok(weights)
}
