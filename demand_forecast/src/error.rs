//! Error types for the demand_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// An hourly sales sequence could not be parsed into exactly 24 numbers
    #[error("Malformed hourly sequence{}: {}", row_suffix(.row), .reason)]
    MalformedSequence {
        /// Zero-based row of the offending table, when known
        row: Option<usize>,
        /// What was wrong with the sequence
        reason: String,
    },

    /// Store/product identifying keys are absent
    #[error("Missing entity key: {0}")]
    MissingEntityKey(String),

    /// A required column of an uploaded or loaded table is absent or unusable
    #[error("Schema error: {0}")]
    Schema(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A persisted artifact was produced for a different feature layout
    #[error("Artifact mismatch: {0}")]
    ArtifactMismatch(String),

    /// Error raised while training or running a forecast model
    #[error("Model error: {0}")]
    ModelError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from (de)serializing artifacts
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

fn row_suffix(row: &Option<usize>) -> String {
    match row {
        Some(row) => format!(" at row {}", row),
        None => String::new(),
    }
}

impl ForecastError {
    /// Build a `MalformedSequence` error without row information
    pub fn malformed(reason: impl Into<String>) -> Self {
        ForecastError::MalformedSequence {
            row: None,
            reason: reason.into(),
        }
    }

    /// Attach a row index to a `MalformedSequence` error; other variants pass through
    pub fn at_row(self, row: usize) -> Self {
        match self {
            ForecastError::MalformedSequence { reason, .. } => ForecastError::MalformedSequence {
                row: Some(row),
                reason,
            },
            other => other,
        }
    }

    /// Short kind for errors caused by the caller's input, `None` otherwise
    pub fn client_kind(&self) -> Option<&'static str> {
        match self {
            ForecastError::MalformedSequence { .. } => Some("malformed_sequence"),
            ForecastError::MissingEntityKey(_) => Some("missing_entity_key"),
            ForecastError::Schema(_) => Some("schema_error"),
            _ => None,
        }
    }

    /// Whether the error was caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        self.client_kind().is_some()
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}
