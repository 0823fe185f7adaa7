//! Metrics for evaluating forecast performance
//!
//! The same functions score per-epoch validation and the held-out test
//! partition. Relative errors divide by `|actual| + MAPE_EPSILON` so that
//! zero-sales days do not blow up.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Added to the denominator of relative errors
pub const MAPE_EPSILON: f64 = 1e-8;

/// A prediction is "accurate" when its relative error is below this
pub const ACCURACY_TOLERANCE: f64 = 0.1;

/// Evaluate predictions against actual values
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<EvaluationMetrics> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::DataError(
            "Actual and predicted values must have the same non-zero length".to_string(),
        ));
    }

    Ok(EvaluationMetrics {
        mae: mean_absolute_error(actual, predicted),
        mse: mean_squared_error(actual, predicted),
        mape: mean_absolute_percentage_error(actual, predicted),
        accuracy: accuracy_within_tolerance(actual, predicted),
        count: actual.len(),
    })
}

/// Relative error of one prediction
pub fn relative_error(actual: f64, predicted: f64) -> f64 {
    (actual - predicted).abs() / (actual.abs() + MAPE_EPSILON)
}

/// Mean absolute error; NaN for empty or mismatched input
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    mean_of(actual, predicted, |a, p| (a - p).abs())
}

/// Mean squared error; NaN for empty or mismatched input
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    mean_of(actual, predicted, |a, p| (a - p).powi(2))
}

/// Mean absolute percentage error, in percent; NaN for empty or mismatched input
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> f64 {
    mean_of(actual, predicted, relative_error) * 100.0
}

/// Fraction of predictions within [`ACCURACY_TOLERANCE`] relative error
pub fn accuracy_within_tolerance(actual: &[f64], predicted: &[f64]) -> f64 {
    mean_of(actual, predicted, |a, p| {
        if relative_error(a, p) < ACCURACY_TOLERANCE {
            1.0
        } else {
            0.0
        }
    })
}

fn mean_of(actual: &[f64], predicted: &[f64], f: impl Fn(f64, f64) -> f64) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual.iter().zip(predicted).map(|(&a, &p)| f(a, p)).sum();
    sum / actual.len() as f64
}

/// Forecast performance metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Mean Absolute Percentage Error, in percent
    pub mape: f64,
    /// Share of predictions within 10% of the actual value
    pub accuracy: f64,
    /// Number of scored predictions
    pub count: usize,
}

impl std::fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Performance Metrics ({} rows):", self.count)?;
        writeln!(f, "  MAE:      {:.4}", self.mae)?;
        writeln!(f, "  MSE:      {:.4}", self.mse)?;
        writeln!(f, "  MAPE:     {:.4}%", self.mape)?;
        writeln!(f, "  Accuracy: {:.2}% (<10% error)", self.accuracy * 100.0)?;
        Ok(())
    }
}
