//! # Demand Forecast
//!
//! Next-day hourly demand forecasting for retail store/product pairs.
//!
//! ## Features
//!
//! - Parsing of 24-value hourly sales sequences in textual list form
//! - Next-day labelling over calendar-adjacent records of one entity
//! - A fixed-order twelve-field feature vector shared by training and serving
//! - A standard scaler fitted on the training partition only and persisted as JSON
//! - Entity-disjoint and chronological train/validation/test partitioning
//! - A multi-branch linear model trained by mini-batch gradient descent
//! - MAE / MSE / MAPE / accuracy-within-10% evaluation
//! - An inference service over paired "today" and "tomorrow" uploads
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use demand_forecast::models::linear::LinearDemandModel;
//! use demand_forecast::split::EntityDisjointSplit;
//! use demand_forecast::{run_training, DataLoader, InferenceService};
//!
//! # fn main() -> demand_forecast::Result<()> {
//! // Load the sales history
//! let records = DataLoader::from_csv("sales.csv")?;
//!
//! // Train with products held out of training
//! let split = EntityDisjointSplit::new(0.7, 0.15, 42)?;
//! let (model, report) = run_training(&records, &split, &LinearDemandModel::default())?;
//!
//! // Persist both artifacts
//! report.scaler.save("scaler.json")?;
//! model.save("demand_model")?;
//!
//! // Serve
//! let service = InferenceService::from_artifacts("scaler.json", "demand_model")?;
//! let predictions = service.predict_csv(b"...", b"...")?;
//! # Ok(())
//! # }
//! ```

pub mod calendar;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod inference;
pub mod metrics;
pub mod models;
pub mod record;
pub mod scaler;
pub mod sequence;
pub mod split;
pub mod training;

// Re-export commonly used types
pub use crate::config::TrainingConfig;
pub use crate::data::DataLoader;
pub use crate::error::{ForecastError, Result};
pub use crate::features::{FeatureVector, FEATURE_NAMES};
pub use crate::inference::{InferenceService, Prediction};
pub use crate::metrics::EvaluationMetrics;
pub use crate::models::{ForecastModel, TrainedForecastModel};
pub use crate::record::{EntityKey, SalesRecord};
pub use crate::scaler::{ScalerState, StandardScaler};
pub use crate::sequence::{summarize, HourlySales, SequenceSummary};
pub use crate::split::{SplitConfig, SplitStrategy};
pub use crate::training::{run_training, TrainingReport};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
