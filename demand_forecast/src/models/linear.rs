//! Linear multi-branch demand model
//!
//! The prediction for one row is
//!
//! ```text
//! bias + Σ embedding[slot][category_id] + num · w_num + (hours / hour_scale) · w_hours
//! ```
//!
//! Each category slot learns one scalar per id seen during training; ids never
//! seen contribute nothing. Weights are fitted by seeded mini-batch gradient
//! descent on mean squared error with the gradient norm clipped per batch.

use super::{
    load_bundle, save_bundle, EpochRecord, ForecastModel, ModelInput, TrainedForecastModel,
    TrainingHistory,
};
use crate::error::{ForecastError, Result};
use crate::features::{NUM_CATEGORIES, NUM_FEATURES};
use crate::metrics::evaluate;
use crate::sequence::HOURS_PER_DAY;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Name recorded in the bundle manifest
pub const MODEL_NAME: &str = "linear_demand";

/// Standard deviation of the initial numeric and hourly weights
const INIT_STD: f64 = 0.01;

/// Mean hourly sales below this leave the sequence branch unnormalized
const HOUR_SCALE_FLOOR: f64 = 1e-8;

/// Training hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearDemandModel {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub seed: u64,
    /// Maximum L2 norm of one batch gradient
    pub clip_norm: f64,
}

/// Fitted weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedLinearDemand {
    bias: f64,
    embeddings: Vec<BTreeMap<i64, f64>>,
    num_weights: Vec<f64>,
    hour_weights: Vec<f64>,
    hour_scale: f64,
}

impl Default for LinearDemandModel {
    fn default() -> Self {
        Self {
            epochs: 20,
            batch_size: 256,
            learning_rate: 0.01,
            seed: 42,
            clip_norm: 5.0,
        }
    }
}

impl LinearDemandModel {
    pub fn new(epochs: usize, batch_size: usize, learning_rate: f64, seed: u64) -> Result<Self> {
        let model = Self {
            epochs,
            batch_size,
            learning_rate,
            seed,
            ..Self::default()
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(ForecastError::InvalidParameter(
                "epochs must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ForecastError::InvalidParameter(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.clip_norm.is_finite() && self.clip_norm > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "clip_norm must be positive, got {}",
                self.clip_norm
            )));
        }
        Ok(())
    }

    fn initial_weights(
        &self,
        input: &ModelInput,
        targets: &[f64],
        rng: &mut StdRng,
    ) -> Result<TrainedLinearDemand> {
        let init = Normal::new(0.0, INIT_STD)
            .map_err(|e| ForecastError::ModelError(format!("weight initializer: {}", e)))?;
        let hour_scale = input
            .hours
            .mean()
            .filter(|mean| *mean > HOUR_SCALE_FLOOR)
            .unwrap_or(1.0);

        Ok(TrainedLinearDemand {
            bias: targets.iter().sum::<f64>() / targets.len() as f64,
            embeddings: vec![BTreeMap::new(); NUM_CATEGORIES],
            num_weights: (0..NUM_FEATURES).map(|_| init.sample(rng)).collect(),
            hour_weights: (0..HOURS_PER_DAY).map(|_| init.sample(rng)).collect(),
            hour_scale,
        })
    }
}

fn check_targets(input: &ModelInput, targets: &[f64], partition: &str) -> Result<()> {
    input.validate()?;
    if targets.len() != input.len() {
        return Err(ForecastError::DataError(format!(
            "{} partition has {} rows but {} targets",
            partition,
            input.len(),
            targets.len()
        )));
    }
    if targets.iter().any(|t| !t.is_finite()) {
        return Err(ForecastError::DataError(format!(
            "{} targets contain non-finite values",
            partition
        )));
    }
    Ok(())
}

impl ForecastModel for LinearDemandModel {
    type Trained = TrainedLinearDemand;

    fn train(
        &self,
        input: &ModelInput,
        targets: &[f64],
        validation: Option<(&ModelInput, &[f64])>,
    ) -> Result<(Self::Trained, TrainingHistory)> {
        self.validate()?;
        check_targets(input, targets, "training")?;
        if input.is_empty() {
            return Err(ForecastError::DataError(
                "cannot train on an empty partition".to_string(),
            ));
        }
        if let Some((val_input, val_targets)) = validation {
            check_targets(val_input, val_targets, "validation")?;
        }
        let validation = validation.filter(|(val_input, _)| !val_input.is_empty());

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut model = self.initial_weights(input, targets, &mut rng)?;
        let mut order: Vec<usize> = (0..input.len()).collect();
        let mut history = TrainingHistory::default();

        for epoch in 1..=self.epochs {
            order.shuffle(&mut rng);
            for batch in order.chunks(self.batch_size) {
                model.step(input, targets, batch, self.learning_rate, self.clip_norm);
            }

            let train = evaluate(targets, &model.predict(input)?)?;
            if !train.mse.is_finite() {
                return Err(ForecastError::ModelError(format!(
                    "training diverged at epoch {}",
                    epoch
                )));
            }
            let validation = match validation {
                Some((val_input, val_targets)) => {
                    Some(evaluate(val_targets, &model.predict(val_input)?)?)
                }
                None => None,
            };

            info!(
                epoch,
                loss = train.mse,
                mae = train.mae,
                val_loss = ?validation.map(|m| m.mse),
                val_mae = ?validation.map(|m| m.mae),
                "epoch complete"
            );
            history.epochs.push(EpochRecord {
                epoch,
                train,
                validation,
            });
        }

        Ok((model, history))
    }

    fn name(&self) -> &str {
        MODEL_NAME
    }
}

fn category_id(input: &ModelInput, row: usize, slot: usize) -> i64 {
    input.cat[[row, slot]] as i64
}

impl TrainedLinearDemand {
    /// Distinct ids learned for each category slot
    pub fn known_categories(&self) -> Vec<usize> {
        self.embeddings.iter().map(BTreeMap::len).collect()
    }

    pub fn hour_scale(&self) -> f64 {
        self.hour_scale
    }

    /// Save to a bundle directory
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        save_bundle(dir.as_ref(), MODEL_NAME, self)
    }

    /// Load from a bundle directory written by [`TrainedLinearDemand::save`]
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let model: Self = load_bundle(dir.as_ref(), MODEL_NAME)?;
        if model.embeddings.len() != NUM_CATEGORIES
            || model.num_weights.len() != NUM_FEATURES
            || model.hour_weights.len() != HOURS_PER_DAY
        {
            return Err(ForecastError::ArtifactMismatch(format!(
                "weights have shapes {} / {} / {}, expected {} / {} / {}",
                model.embeddings.len(),
                model.num_weights.len(),
                model.hour_weights.len(),
                NUM_CATEGORIES,
                NUM_FEATURES,
                HOURS_PER_DAY
            )));
        }
        if !(model.hour_scale.is_finite() && model.hour_scale > 0.0) {
            return Err(ForecastError::ArtifactMismatch(format!(
                "invalid hour scale {}",
                model.hour_scale
            )));
        }
        Ok(model)
    }

    fn predict_row(&self, input: &ModelInput, row: usize) -> f64 {
        let categorical: f64 = self
            .embeddings
            .iter()
            .enumerate()
            .filter_map(|(slot, table)| table.get(&category_id(input, row, slot)))
            .sum();
        let numeric: f64 = input
            .num
            .row(row)
            .iter()
            .zip(&self.num_weights)
            .map(|(x, w)| x * w)
            .sum();
        let hourly: f64 = self
            .hour_weights
            .iter()
            .enumerate()
            .map(|(hour, w)| input.hours[[row, hour, 0]] / self.hour_scale * w)
            .sum();
        self.bias + categorical + numeric + hourly
    }

    /// One clipped gradient step on the rows in `batch`
    fn step(
        &mut self,
        input: &ModelInput,
        targets: &[f64],
        batch: &[usize],
        learning_rate: f64,
        clip_norm: f64,
    ) {
        let scale = 2.0 / batch.len() as f64;
        let mut grad_bias = 0.0;
        let mut grad_num = [0.0; NUM_FEATURES];
        let mut grad_hours = [0.0; HOURS_PER_DAY];
        let mut grad_embed: Vec<BTreeMap<i64, f64>> = vec![BTreeMap::new(); NUM_CATEGORIES];

        for &row in batch {
            let err = scale * (self.predict_row(input, row) - targets[row]);
            grad_bias += err;
            for (grad, x) in grad_num.iter_mut().zip(input.num.row(row)) {
                *grad += err * x;
            }
            for (hour, grad) in grad_hours.iter_mut().enumerate() {
                *grad += err * input.hours[[row, hour, 0]] / self.hour_scale;
            }
            for (slot, grads) in grad_embed.iter_mut().enumerate() {
                *grads.entry(category_id(input, row, slot)).or_insert(0.0) += err;
            }
        }

        let norm = (grad_bias * grad_bias
            + grad_num
                .iter()
                .chain(&grad_hours)
                .chain(grad_embed.iter().flat_map(|grads| grads.values()))
                .map(|g| g * g)
                .sum::<f64>())
        .sqrt();
        let rate = if norm > clip_norm {
            debug!(norm, clip_norm, "clipped gradient");
            learning_rate * clip_norm / norm
        } else {
            learning_rate
        };

        self.bias -= rate * grad_bias;
        for (w, g) in self.num_weights.iter_mut().zip(grad_num) {
            *w -= rate * g;
        }
        for (w, g) in self.hour_weights.iter_mut().zip(grad_hours) {
            *w -= rate * g;
        }
        for (table, grads) in self.embeddings.iter_mut().zip(grad_embed) {
            for (id, g) in grads {
                *table.entry(id).or_insert(0.0) -= rate * g;
            }
        }
    }
}

impl TrainedForecastModel for TrainedLinearDemand {
    fn predict(&self, input: &ModelInput) -> Result<Vec<f64>> {
        input.validate()?;
        Ok((0..input.len())
            .map(|row| self.predict_row(input, row))
            .collect())
    }

    fn name(&self) -> &str {
        MODEL_NAME
    }
}
