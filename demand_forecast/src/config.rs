//! Training job configuration

use crate::error::{ForecastError, Result};
use crate::models::linear::LinearDemandModel;
use crate::split::SplitConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the training job writes its outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    pub scaler_path: PathBuf,
    pub model_dir: PathBuf,
    /// Per-epoch history; written as CSV when the extension is `.csv`, JSON otherwise
    pub history_path: Option<PathBuf>,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            scaler_path: PathBuf::from("scaler.json"),
            model_dir: PathBuf::from("demand_model"),
            history_path: None,
        }
    }
}

/// Full training configuration; every field has a default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub split: SplitConfig,
    pub model: LinearDemandModel,
    pub artifacts: ArtifactPaths,
}

impl TrainingConfig {
    /// Read a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: TrainingConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.split.build()?;
        self.model.validate()?;
        if self.artifacts.model_dir.as_os_str().is_empty() {
            return Err(ForecastError::InvalidParameter(
                "model_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::ChronologicalSplit;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: TrainingConfig = serde_json::from_str(
            r#"{
                "split": {"policy": "chronological", "train_percentile": 70.0, "val_percentile": 85.0},
                "model": {"epochs": 5}
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.split,
            SplitConfig::Chronological(ChronologicalSplit {
                train_percentile: 70.0,
                val_percentile: Some(85.0)
            })
        );
        assert_eq!(config.model.epochs, 5);
        assert_eq!(config.model.batch_size, 256);
        assert_eq!(config.artifacts, ArtifactPaths::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_model_parameters_rejected() {
        let config: TrainingConfig =
            serde_json::from_str(r#"{"model": {"learning_rate": -1.0}}"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ForecastError::InvalidParameter(_))
        ));
    }
}
