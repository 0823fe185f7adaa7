//! # Demand Forecast Workspace
//!
//! Next-day hourly demand forecasting for retail store/product pairs.
//!
//! - [`forecast`]: sequence parsing, feature assembly, scaling, partitioning,
//!   model training and the inference service (the `demand_forecast` crate)
//! - [`server`]: the HTTP prediction service (the `demand_server` crate)
//!
//! ## Example
//!
//! ```
//! use demand_forecast_workspace::forecast::summarize;
//!
//! let mut hours = vec![0.0; 24];
//! hours[12] = 10.0;
//! let summary = summarize(&hours).unwrap();
//! assert!((summary.mean - 10.0 / 24.0).abs() < 1e-12);
//! ```

pub use demand_forecast as forecast;
pub use demand_server as server;
