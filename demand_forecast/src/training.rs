//! Offline training job
//!
//! label → split → fit scaler on train → vectorize → train → score test

use crate::error::{ForecastError, Result};
use crate::features::{label_examples, AssembledFeatures, LabeledExample};
use crate::metrics::{evaluate, EvaluationMetrics};
use crate::models::{ForecastModel, ModelInput, TrainedForecastModel, TrainingHistory};
use crate::record::SalesRecord;
use crate::scaler::ScalerState;
use crate::split::SplitStrategy;
use tracing::{info, warn};

/// Outcome of a training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Sizes of (train, validation, test)
    pub sizes: (usize, usize, usize),
    pub history: TrainingHistory,
    /// Held-out metrics; `None` when the test partition is empty
    pub test_metrics: Option<EvaluationMetrics>,
    pub scaler: ScalerState,
}

fn vectorize(examples: &[LabeledExample], scaler: &ScalerState) -> (ModelInput, Vec<f64>) {
    let features: Vec<AssembledFeatures> =
        examples.iter().map(|e| e.features.clone()).collect();
    let targets = examples.iter().map(|e| e.mean_tomorrow).collect();
    (ModelInput::from_features(&features, scaler), targets)
}

/// Run the full pipeline over loaded records
pub fn run_training<M: ForecastModel>(
    records: &[SalesRecord],
    split: &dyn SplitStrategy,
    model: &M,
) -> Result<(M::Trained, TrainingReport)> {
    let examples = label_examples(records);
    if examples.is_empty() {
        return Err(ForecastError::DataError(
            "no record has a next-day counterpart; nothing to train on".to_string(),
        ));
    }

    let partitions = split.split(examples)?;
    let sizes = partitions.sizes();
    info!(policy = split.name(), ?sizes, "partitioned examples");
    if partitions.train.is_empty() {
        return Err(ForecastError::DataError(format!(
            "{} split left the training partition empty",
            split.name()
        )));
    }
    if partitions.validation.is_empty() {
        warn!("validation partition is empty; epochs are scored on training data only");
    }

    let scaler = partitions.fit_scaler()?;
    let (train_input, train_targets) = vectorize(&partitions.train, &scaler);
    let (val_input, val_targets) = vectorize(&partitions.validation, &scaler);
    let (test_input, test_targets) = vectorize(&partitions.test, &scaler);

    let (trained, history) = model.train(
        &train_input,
        &train_targets,
        Some((&val_input, &val_targets)),
    )?;

    let test_metrics = if test_input.is_empty() {
        warn!("test partition is empty; skipping held-out evaluation");
        None
    } else {
        let metrics = evaluate(&test_targets, &trained.predict(&test_input)?)?;
        info!(
            model = model.name(),
            mae = metrics.mae,
            mse = metrics.mse,
            mape = metrics.mape,
            accuracy = metrics.accuracy,
            "held-out evaluation"
        );
        Some(metrics)
    };

    Ok((
        trained,
        TrainingReport {
            sizes,
            history,
            test_metrics,
            scaler,
        },
    ))
}
