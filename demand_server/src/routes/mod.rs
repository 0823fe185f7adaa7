//! Route handlers
//!
//! - [`health`]: service and artifact summary
//! - [`predict`]: next-day forecasts for uploaded tables

pub mod health;
pub mod predict;
