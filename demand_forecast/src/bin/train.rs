//! Offline training job
//!
//! Reads a sales table, trains the default linear model and writes the scaler
//! and model bundle that `demand_server` loads.

use clap::Parser;
use demand_forecast::models::linear::LinearDemandModel;
use demand_forecast::{run_training, DataLoader, TrainingConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "train", version, about = "Train the next-day demand model")]
struct Args {
    /// CSV table with store_id, product_id, dt, hours_sale and context columns
    #[arg(short, long)]
    input: PathBuf,

    /// JSON training configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the scaler output path
    #[arg(long)]
    scaler_path: Option<PathBuf>,

    /// Override the model bundle directory
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Write the per-epoch history here (.csv or .json)
    #[arg(long)]
    history: Option<PathBuf>,

    /// Override the number of epochs
    #[arg(long)]
    epochs: Option<usize>,
}

fn run(args: Args) -> demand_forecast::Result<()> {
    let mut config = match &args.config {
        Some(path) => TrainingConfig::from_json_file(path)?,
        None => TrainingConfig::default(),
    };
    if let Some(path) = args.scaler_path {
        config.artifacts.scaler_path = path;
    }
    if let Some(dir) = args.model_dir {
        config.artifacts.model_dir = dir;
    }
    if let Some(path) = args.history {
        config.artifacts.history_path = Some(path);
    }
    if let Some(epochs) = args.epochs {
        config.model = LinearDemandModel {
            epochs,
            ..config.model
        };
    }
    config.validate()?;

    let records = DataLoader::from_csv(&args.input)?;
    let split = config.split.build()?;
    let (model, report) = run_training(&records, split.as_ref(), &config.model)?;

    report.scaler.save(&config.artifacts.scaler_path)?;
    model.save(&config.artifacts.model_dir)?;

    if let Some(path) = &config.artifacts.history_path {
        if path.extension().map_or(false, |ext| ext == "csv") {
            report.history.write_csv(path)?;
        } else {
            report.history.save_json(path)?;
        }
        info!(path = %path.display(), "wrote training history");
    }

    let (train, validation, test) = report.sizes;
    println!("Examples: train {}, validation {}, test {}", train, validation, test);
    match &report.test_metrics {
        Some(metrics) => print!("{}", metrics),
        None => println!("No held-out examples to evaluate"),
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demand_forecast=info,train=info".into()),
        )
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "training failed");
            ExitCode::FAILURE
        }
    }
}
