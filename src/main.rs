//! churnflow: Telco churn preprocessing and tracked model training
//!
//! `churnflow preprocess` turns the raw dataset into train/val/test CSV files;
//! `churnflow train` fits a classifier on them and logs the run to an
//! MLflow-compatible tracker.

use anyhow::Result;
use clap::Parser;

use churnflow::cli::{run_preprocess, run_train, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Preprocess(args) => run_preprocess(args).map(|_| ()),
        Commands::Train(args) => run_train(args).map(|_| ()),
    }
}
