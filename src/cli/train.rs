//! The training job: fit on train, evaluate on validation, log the run

use std::time::Instant;

use anyhow::{Context, Result};
use console::style;

use super::args::TrainArgs;
use crate::model::{compute_metrics, FeatureSet, LogisticRegression};
use crate::pipeline::{load_dataset, TrainConfig, MODEL_TYPE};
use crate::report::TrainingSummary;
use crate::tracking::{Tracker, TrackingConfig};
use crate::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion,
    print_info, print_shape, print_step_header, print_step_time, print_success,
    print_train_config,
};

/// Artifact path the fitted model is stored under within the run
pub const MODEL_ARTIFACT_PATH: &str = "model";

/// Run the training job with the default model settings and the tracker
/// configured in the environment
pub fn run_train(args: &TrainArgs) -> Result<TrainingSummary> {
    run_train_with(args, &TrainConfig::default(), &TrackingConfig::from_env())
}

/// Fit, evaluate and log one training run.
///
/// Any error after the run has started leaves it marked FAILED in the tracker.
pub fn run_train_with(
    args: &TrainArgs,
    config: &TrainConfig,
    tracking: &TrackingConfig,
) -> Result<TrainingSummary> {
    print_banner("train", env!("CARGO_PKG_VERSION"));
    print_train_config(
        &args.train_path,
        &args.val_path,
        &args.model_name,
        &tracking.tracking_uri,
    );

    // Step 1: Load partitions
    print_step_header(1, "Load Partitions");
    let step_start = Instant::now();
    let spinner = create_spinner("Reading partitions...");
    let train_df = load_dataset(&args.train_path, args.infer_schema_length)
        .context("Failed to load training partition")?;
    let val_df = load_dataset(&args.val_path, args.infer_schema_length)
        .context("Failed to load validation partition")?;
    finish_with_success(&spinner, "Partitions loaded");

    let train = FeatureSet::from_frame(&train_df, &config.label_column, &config.id_column)
        .context("Training partition is not usable as model input")?;
    let val = FeatureSet::aligned_to(
        &val_df,
        &config.label_column,
        &config.id_column,
        &train.feature_names,
    )
    .context("Validation partition is not usable as model input")?;
    print_shape("Train", train.n_rows(), train.n_features());
    print_shape("Validation", val.n_rows(), val.n_features());
    print_step_time(step_start.elapsed());

    // Step 2: Open the tracked run
    print_step_header(2, "Start Tracked Run");
    let tracker = Tracker::open(tracking)?;
    print_info(&format!(
        "Experiment '{}' ({})",
        tracker.experiment_name(),
        tracker.describe()
    ));

    let run_name = format!("train-{}", chrono::Local::now().format("%Y%m%d-%H%M%S"));
    let run = tracker.start_run(&run_name)?;
    println!("      MLflow Run ID: {}", style(run.run_id()).cyan().bold());

    // Step 3: Fit
    print_step_header(3, "Fit Logistic Regression");
    let step_start = Instant::now();
    let spinner = create_spinner("Fitting model...");
    let model = LogisticRegression::from_config(config).fit(&train)?;
    if model.converged {
        finish_with_success(
            &spinner,
            &format!("Model fitted in {} iteration(s)", model.n_iter),
        );
    } else {
        finish_with_warning(
            &spinner,
            &format!("Solver stopped after {} iterations without converging", model.n_iter),
        );
    }
    print_step_time(step_start.elapsed());

    // Step 4: Evaluate
    print_step_header(4, "Evaluate on Validation");
    let predictions = model.predict(&val.x)?;
    let metrics = compute_metrics(&val.y, &predictions)?;
    let val_log_loss = model.log_loss(&val)?;
    println!(
        "      Validation F1 Score: {}",
        style(format!("{:.4}", metrics.f1)).yellow().bold()
    );

    // Step 5: Log to tracker
    print_step_header(5, "Log Run");
    let spinner = create_spinner("Logging params, metrics and model...");
    run.log_param("model_type", MODEL_TYPE)?;
    for (key, value) in metrics.as_logged() {
        run.log_metric(key, value)?;
    }
    let version = run.log_model(MODEL_ARTIFACT_PATH, &model, &args.model_name)?;
    finish_with_success(
        &spinner,
        &format!("Registered {} version {}", version.name, version.version),
    );

    let run_id = run.run_id().to_string();
    run.finish()?;
    print_success("Run finished");

    let summary = TrainingSummary {
        run_id,
        experiment_name: tracker.experiment_name().to_string(),
        model_name: version.name,
        model_version: version.version,
        n_train: train.n_rows(),
        n_val: val.n_rows(),
        n_features: train.n_features(),
        n_iter: model.n_iter,
        converged: model.converged,
        metrics,
        val_log_loss,
    };
    summary.display();
    print_completion("Training complete!");

    Ok(summary)
}
