//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::DEFAULT_MODEL_NAME;

/// churnflow - Prepare the Telco churn dataset and train a tracked churn classifier
#[derive(Parser, Debug)]
#[command(name = "churnflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clean, encode and split the raw dataset into train/val/test CSV files
    Preprocess(PreprocessArgs),

    /// Fit a logistic regression model and log the run to the experiment tracker.
    /// The tracker is configured through MLFLOW_TRACKING_URI and MLFLOW_EXPERIMENT_NAME.
    Train(TrainArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PreprocessArgs {
    /// Raw dataset (CSV with header row)
    #[arg(long)]
    pub input_path: PathBuf,

    /// Directory receiving train.csv, val.csv and test.csv (created if absent)
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Number of rows to use for schema inference.
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Training partition written by `preprocess`
    #[arg(long)]
    pub train_path: PathBuf,

    /// Validation partition written by `preprocess`
    #[arg(long)]
    pub val_path: PathBuf,

    /// Name the fitted model is registered under
    #[arg(long, default_value = DEFAULT_MODEL_NAME)]
    pub model_name: String,

    /// Number of rows to use for schema inference.
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}
