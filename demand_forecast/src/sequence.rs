//! Hourly sales sequences
//!
//! A day's sales arrive as 24 per-hour values, either already numeric or as a
//! textual list taken from an uploaded table. Text is untrusted, so it goes
//! through [`parse_sequence`], a strict tokenizer that only ever produces
//! finite, non-negative `f64` values. Accepted forms:
//!
//! - `[1, 0, 2.5, ...]` (JSON / Python list)
//! - `[1. 0. 2.5 ...]` (NumPy array repr, possibly wrapped over lines)
//! - `1,0,2.5,...` (bare list)

use crate::error::{ForecastError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Number of hourly slots in one day's sequence
pub const HOURS_PER_DAY: usize = 24;

/// A validated 24-hour sales sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlySales([f64; HOURS_PER_DAY]);

/// Result of summarizing a day's sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceSummary {
    /// Arithmetic mean over all 24 hours, zeros included
    pub mean: f64,
    /// The validated values
    pub values: HourlySales,
}

impl HourlySales {
    /// Validate a numeric slice as a 24-hour sequence
    pub fn from_values(values: &[f64]) -> Result<Self> {
        if values.len() != HOURS_PER_DAY {
            return Err(ForecastError::malformed(format!(
                "expected {} hourly values, found {}",
                HOURS_PER_DAY,
                values.len()
            )));
        }

        let mut hours = [0.0; HOURS_PER_DAY];
        for (hour, &value) in values.iter().enumerate() {
            hours[hour] = check_value(value, hour)?;
        }

        Ok(Self(hours))
    }

    /// Parse the textual form of a sequence
    pub fn parse(text: &str) -> Result<Self> {
        let values = parse_sequence(text)?;
        Self::from_values(&values)
    }

    /// The 24 values in hour order
    pub fn values(&self) -> &[f64; HOURS_PER_DAY] {
        &self.0
    }

    /// Mean hourly sales
    pub fn mean(&self) -> f64 {
        self.0.iter().sum::<f64>() / HOURS_PER_DAY as f64
    }

    /// Total sales for the day
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// The sequence as a (24, 1) time-step tensor
    pub fn to_tensor(&self) -> Array2<f64> {
        Array2::from_shape_fn((HOURS_PER_DAY, 1), |(hour, _)| self.0[hour])
    }
}

/// Summarize an already-numeric sequence
pub fn summarize(values: &[f64]) -> Result<SequenceSummary> {
    let values = HourlySales::from_values(values)?;
    Ok(SequenceSummary {
        mean: values.mean(),
        values,
    })
}

/// Summarize a textual sequence
pub fn summarize_text(text: &str) -> Result<SequenceSummary> {
    let values = HourlySales::parse(text)?;
    Ok(SequenceSummary {
        mean: values.mean(),
        values,
    })
}

/// Tokenize a textual numeric list
///
/// Brackets may wrap the whole list only; tokens are separated by commas
/// and/or whitespace. Anything that is not a plain decimal number (including
/// `nan`, `inf`, nested lists or identifiers) is rejected.
pub fn parse_sequence(text: &str) -> Result<Vec<f64>> {
    let trimmed = text.trim();
    let body = match (trimmed.strip_prefix('['), trimmed.strip_suffix(']')) {
        (Some(_), Some(_)) if trimmed.len() >= 2 => &trimmed[1..trimmed.len() - 1],
        (None, None) => trimmed,
        _ => return Err(ForecastError::malformed("unbalanced brackets")),
    };

    if body.contains('[') || body.contains(']') {
        return Err(ForecastError::malformed("nested lists are not allowed"));
    }

    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut values = Vec::with_capacity(HOURS_PER_DAY);
    for piece in body.split(',') {
        let tokens: Vec<&str> = piece.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(ForecastError::malformed("empty element in list"));
        }
        for token in tokens {
            values.push(parse_token(token, values.len())?);
        }
    }

    Ok(values)
}

fn parse_token(token: &str, position: usize) -> Result<f64> {
    let numeric = token
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if !numeric {
        return Err(ForecastError::malformed(format!(
            "element {} ('{}') is not numeric",
            position, token
        )));
    }

    token.parse::<f64>().map_err(|_| {
        ForecastError::malformed(format!("element {} ('{}') is not numeric", position, token))
    })
}

fn check_value(value: f64, hour: usize) -> Result<f64> {
    if !value.is_finite() {
        return Err(ForecastError::malformed(format!(
            "hour {} is not a finite number",
            hour
        )));
    }
    if value < 0.0 {
        return Err(ForecastError::malformed(format!(
            "hour {} has negative sales {}",
            hour, value
        )));
    }
    Ok(value)
}
