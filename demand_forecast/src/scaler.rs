//! Standardization of the numeric feature vector
//!
//! [`StandardScaler::fit`] produces an immutable [`ScalerState`]. The state is
//! written once by the training job and read back unchanged by the server;
//! both sides go through [`ScalerState::apply`], which never refits.

use crate::error::{ForecastError, Result};
use crate::features::{FeatureVector, FEATURE_NAMES, NUM_FEATURES};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fs;
use std::path::Path;
use tracing::info;

/// Standard deviations below this are treated as a constant feature
pub const STD_EPSILON: f64 = 1e-8;

/// Fits per-feature mean and standard deviation
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScaler;

/// Fitted scaling parameters, positional over [`FEATURE_NAMES`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    feature_names: Vec<String>,
    mean: Vec<f64>,
    std: Vec<f64>,
    n_samples: usize,
}

impl StandardScaler {
    /// Fit on the training vectors
    ///
    /// Uses the population standard deviation. Pass only training-partition
    /// vectors; see `Partitions::fit_scaler`.
    pub fn fit(vectors: &[FeatureVector]) -> Result<ScalerState> {
        if vectors.is_empty() {
            return Err(ForecastError::DataError(
                "cannot fit a scaler on zero vectors".to_string(),
            ));
        }

        let mut mean = Vec::with_capacity(NUM_FEATURES);
        let mut std = Vec::with_capacity(NUM_FEATURES);
        for idx in 0..NUM_FEATURES {
            let column: Vec<f64> = vectors.iter().map(|v| v.values()[idx]).collect();
            mean.push(column.iter().mean());
            std.push(column.iter().population_std_dev());
        }

        Ok(ScalerState {
            feature_names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            mean,
            std,
            n_samples: vectors.len(),
        })
    }
}

impl ScalerState {
    /// Standardize one vector: `(x - mean) / std`
    pub fn apply(&self, vector: &FeatureVector) -> FeatureVector {
        let mut scaled = [0.0; NUM_FEATURES];
        for (idx, value) in vector.values().iter().enumerate() {
            scaled[idx] = (value - self.mean[idx]) / self.scale(idx);
        }
        FeatureVector::from_array(scaled)
    }

    /// Divisor used for a feature; constant features divide by 1
    pub fn scale(&self, idx: usize) -> f64 {
        let std = self.std[idx];
        if std < STD_EPSILON {
            1.0
        } else {
            std
        }
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn std(&self) -> &[f64] {
        &self.std
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Number of vectors the state was fitted on
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Write the state as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), samples = self.n_samples, "saved scaler");
        Ok(())
    }

    /// Read a state written by [`ScalerState::save`]
    ///
    /// Fails if it was fitted for a different feature list or order.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let state: ScalerState = serde_json::from_str(&fs::read_to_string(path)?)?;
        state.validate()?;
        info!(path = %path.display(), samples = state.n_samples, "loaded scaler");
        Ok(state)
    }

    fn validate(&self) -> Result<()> {
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(ForecastError::ArtifactMismatch(format!(
                "scaler was fitted on features {:?}, expected {:?}",
                self.feature_names, FEATURE_NAMES
            )));
        }
        if self.mean.len() != NUM_FEATURES || self.std.len() != NUM_FEATURES {
            return Err(ForecastError::ArtifactMismatch(format!(
                "scaler holds {} means and {} deviations for {} features",
                self.mean.len(),
                self.std.len(),
                NUM_FEATURES
            )));
        }
        if self.mean.iter().chain(&self.std).any(|v| !v.is_finite()) {
            return Err(ForecastError::ArtifactMismatch(
                "scaler parameters are not finite".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vector(first: f64, second: f64) -> FeatureVector {
        let mut values = [7.0; NUM_FEATURES];
        values[0] = first;
        values[1] = second;
        FeatureVector::from_array(values)
    }

    #[test]
    fn test_fit_matches_population_statistics() {
        let state = StandardScaler::fit(&[vector(1.0, 10.0), vector(3.0, 30.0)]).unwrap();
        assert_relative_eq!(state.mean()[0], 2.0);
        assert_relative_eq!(state.std()[0], 1.0);
        assert_relative_eq!(state.mean()[1], 20.0);
        assert_relative_eq!(state.std()[1], 10.0);

        let scaled = state.apply(&vector(3.0, 10.0));
        assert_relative_eq!(scaled.values()[0], 1.0);
        assert_relative_eq!(scaled.values()[1], -1.0);
    }

    #[test]
    fn test_constant_feature_does_not_divide_by_zero() {
        let state = StandardScaler::fit(&[vector(1.0, 1.0), vector(2.0, 1.0)]).unwrap();
        let scaled = state.apply(&vector(1.5, 4.0));
        assert!(scaled.values().iter().all(|v| v.is_finite()));
        // column 2.. is constant 7.0
        assert_relative_eq!(scaled.values()[2], 0.0);
        assert_relative_eq!(scaled.values()[1], 3.0);
    }

    #[test]
    fn test_fit_rejects_empty_input() {
        assert!(StandardScaler::fit(&[]).is_err());
    }
}
