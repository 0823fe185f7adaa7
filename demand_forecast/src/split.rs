//! Train/validation/test partitioning of labelled examples
//!
//! Two policies share the [`SplitStrategy`] interface:
//!
//! - [`EntityDisjointSplit`] buckets whole products, so no product's history
//!   is seen in training and then scored again in evaluation.
//! - [`ChronologicalSplit`] cuts at a date percentile, measuring extrapolation
//!   into the future.

use crate::error::{ForecastError, Result};
use crate::features::{FeatureVector, LabeledExample};
use crate::scaler::{ScalerState, StandardScaler};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;
use tracing::info;

/// Examples divided into disjoint partitions
#[derive(Debug, Clone, Default)]
pub struct Partitions {
    pub train: Vec<LabeledExample>,
    pub validation: Vec<LabeledExample>,
    pub test: Vec<LabeledExample>,
}

impl Partitions {
    /// Fit the scaler on the training partition
    ///
    /// This is the only place the training job fits scaling parameters, so
    /// validation and test rows can never leak into them.
    pub fn fit_scaler(&self) -> Result<ScalerState> {
        let vectors: Vec<FeatureVector> = self.train.iter().map(|e| e.features.numeric).collect();
        StandardScaler::fit(&vectors)
    }

    /// Sizes of (train, validation, test)
    pub fn sizes(&self) -> (usize, usize, usize) {
        (self.train.len(), self.validation.len(), self.test.len())
    }
}

/// A partitioning policy
pub trait SplitStrategy: Debug {
    /// Divide the examples; every input example lands in exactly one partition
    fn split(&self, examples: Vec<LabeledExample>) -> Result<Partitions>;

    /// Name of the policy
    fn name(&self) -> &str;
}

/// Random split over distinct products
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityDisjointSplit {
    /// Share of products used for training
    pub train_ratio: f64,
    /// Share of products used for validation; the rest go to test
    pub val_ratio: f64,
    /// Shuffle seed
    pub seed: u64,
}

/// Split at a percentile of observed dates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChronologicalSplit {
    /// Examples dated at or before this percentile train the model
    pub train_percentile: f64,
    /// Optional second cutoff; later examples form the test partition
    pub val_percentile: Option<f64>,
}

/// Serialized choice of partitioning policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SplitConfig {
    EntityDisjoint(EntityDisjointSplit),
    Chronological(ChronologicalSplit),
}

impl Default for EntityDisjointSplit {
    fn default() -> Self {
        Self {
            train_ratio: 0.7,
            val_ratio: 0.15,
            seed: 42,
        }
    }
}

impl Default for ChronologicalSplit {
    fn default() -> Self {
        Self {
            train_percentile: 80.0,
            val_percentile: None,
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig::EntityDisjoint(EntityDisjointSplit::default())
    }
}

impl SplitConfig {
    /// Validate and build the configured strategy
    pub fn build(&self) -> Result<Box<dyn SplitStrategy>> {
        match self {
            SplitConfig::EntityDisjoint(split) => {
                split.validate()?;
                Ok(Box::new(split.clone()))
            }
            SplitConfig::Chronological(split) => {
                split.validate()?;
                Ok(Box::new(split.clone()))
            }
        }
    }
}

impl EntityDisjointSplit {
    pub fn new(train_ratio: f64, val_ratio: f64, seed: u64) -> Result<Self> {
        let split = Self {
            train_ratio,
            val_ratio,
            seed,
        };
        split.validate()?;
        Ok(split)
    }

    fn validate(&self) -> Result<()> {
        if !(self.train_ratio > 0.0 && self.train_ratio <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "train_ratio must be in (0, 1], got {}",
                self.train_ratio
            )));
        }
        if self.val_ratio < 0.0 || self.train_ratio + self.val_ratio > 1.0 + 1e-9 {
            return Err(ForecastError::InvalidParameter(format!(
                "val_ratio must be non-negative and leave train_ratio + val_ratio <= 1, got {} + {}",
                self.train_ratio, self.val_ratio
            )));
        }
        Ok(())
    }
}

impl SplitStrategy for EntityDisjointSplit {
    fn split(&self, examples: Vec<LabeledExample>) -> Result<Partitions> {
        self.validate()?;

        let mut products: Vec<i64> = examples
            .iter()
            .map(|e| e.entity.product_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        products.shuffle(&mut rng);

        let n = products.len();
        let n_train = (self.train_ratio * n as f64).floor() as usize;
        // Ratios summing to 1 leave no test bucket; the floor remainder goes to validation
        let n_val = if self.train_ratio + self.val_ratio >= 1.0 - 1e-9 {
            n - n_train
        } else {
            ((self.val_ratio * n as f64).floor() as usize).min(n - n_train)
        };

        let bucket: HashMap<i64, usize> = products
            .iter()
            .enumerate()
            .map(|(position, &product)| {
                let bucket = if position < n_train {
                    0
                } else if position < n_train + n_val {
                    1
                } else {
                    2
                };
                (product, bucket)
            })
            .collect();

        let mut partitions = Partitions::default();
        for example in examples {
            match bucket[&example.entity.product_id] {
                0 => partitions.train.push(example),
                1 => partitions.validation.push(example),
                _ => partitions.test.push(example),
            }
        }

        info!(
            products = n,
            train_products = n_train,
            val_products = n_val,
            sizes = ?partitions.sizes(),
            "entity-disjoint split"
        );
        Ok(partitions)
    }

    fn name(&self) -> &str {
        "entity_disjoint"
    }
}

impl ChronologicalSplit {
    pub fn new(train_percentile: f64, val_percentile: Option<f64>) -> Result<Self> {
        let split = Self {
            train_percentile,
            val_percentile,
        };
        split.validate()?;
        Ok(split)
    }

    fn validate(&self) -> Result<()> {
        let in_range = |p: f64| p > 0.0 && p <= 100.0;
        if !in_range(self.train_percentile) {
            return Err(ForecastError::InvalidParameter(format!(
                "train_percentile must be in (0, 100], got {}",
                self.train_percentile
            )));
        }
        if let Some(val) = self.val_percentile {
            if !in_range(val) || val < self.train_percentile {
                return Err(ForecastError::InvalidParameter(format!(
                    "val_percentile must be in [train_percentile, 100], got {}",
                    val
                )));
            }
        }
        Ok(())
    }
}

/// Nearest-rank percentile of sorted dates
fn date_percentile(sorted: &[NaiveDate], percentile: f64) -> NaiveDate {
    let rank = ((percentile / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

impl SplitStrategy for ChronologicalSplit {
    fn split(&self, examples: Vec<LabeledExample>) -> Result<Partitions> {
        self.validate()?;
        if examples.is_empty() {
            return Ok(Partitions::default());
        }

        let mut dates: Vec<NaiveDate> = examples.iter().map(|e| e.dt).collect();
        dates.sort();
        let train_cutoff = date_percentile(&dates, self.train_percentile);
        let val_cutoff = self.val_percentile.map(|p| date_percentile(&dates, p));

        let mut partitions = Partitions::default();
        for example in examples {
            if example.dt <= train_cutoff {
                partitions.train.push(example);
            } else if val_cutoff.map_or(true, |cutoff| example.dt <= cutoff) {
                partitions.validation.push(example);
            } else {
                partitions.test.push(example);
            }
        }

        info!(
            train_cutoff = %train_cutoff,
            val_cutoff = ?val_cutoff,
            sizes = ?partitions.sizes(),
            "chronological split"
        );
        Ok(partitions)
    }

    fn name(&self) -> &str {
        "chronological"
    }
}
