//! The preprocessing job: raw dataset in, train/val/test partitions out

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use polars::prelude::*;

use super::args::PreprocessArgs;
use crate::pipeline::{
    binarize_yes_no, categorical_columns, coerce_numeric, ensure_output_dir, impute_median,
    load_dataset, one_hot_encode, require_column, save_dataset, split_partitions,
    Partitions, PreprocessConfig,
};
use crate::report::PreprocessSummary;
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_count, print_info,
    print_preprocess_config, print_shape, print_step_header, print_step_time, print_success,
};

pub const TRAIN_FILE: &str = "train.csv";
pub const VAL_FILE: &str = "val.csv";
pub const TEST_FILE: &str = "test.csv";

/// Run the preprocessing job with the Telco defaults
pub fn run_preprocess(args: &PreprocessArgs) -> Result<PreprocessSummary> {
    run_preprocess_with(args, &PreprocessConfig::default())
}

/// Load, clean, encode and split the dataset, then write the three partitions.
///
/// The output directory is only touched once every earlier step succeeded.
pub fn run_preprocess_with(args: &PreprocessArgs, config: &PreprocessConfig) -> Result<PreprocessSummary> {
    let job_start = Instant::now();

    print_banner("preprocess", env!("CARGO_PKG_VERSION"));
    print_preprocess_config(&args.input_path, &args.output_dir, &config.label_column);

    // Step 1: Load
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let spinner = create_spinner("Reading CSV...");
    let mut df = load_dataset(&args.input_path, args.infer_schema_length)?;
    finish_with_success(&spinner, "Dataset loaded");
    print_shape("Raw", df.height(), df.width());

    require_column(&df, &config.label_column)
        .context("The label column is required to stratify the split")?;

    let mut summary = PreprocessSummary::new(df.height(), df.width());
    print_step_time(step_start.elapsed());

    // Step 2: Clean and encode
    print_step_header(2, "Clean & Encode");
    let step_start = Instant::now();

    let missing = coerce_numeric(&mut df, &config.charges_column)?;
    let median = impute_median(&mut df, &config.charges_column)?;
    match median {
        Some(m) if missing > 0 => {
            print_count(
                &format!("missing value(s) in {}", config.charges_column),
                missing,
                Some(&format!("(imputed with median {:.2})", m)),
            );
        }
        Some(_) => print_info(&format!("No missing values in {}", config.charges_column)),
        None => print_info(&format!(
            "{} has no values to compute a median from",
            config.charges_column
        )),
    }
    summary.set_imputation(missing, median);

    binarize_yes_no(&mut df, &config.binary_columns)?;

    let categoricals = categorical_columns(&df, &[config.id_column.as_str()]);
    let encoded = one_hot_encode(&mut df, &categoricals)?;
    print_count(
        "categorical column(s)",
        categoricals.len(),
        Some(&format!("-> {} indicator column(s)", encoded.len())),
    );
    summary.set_encoding(encoded, df.width());

    print_success("Data cleaned and encoded.");
    print_step_time(step_start.elapsed());

    // Step 3: Split
    print_step_header(3, "Stratified Split");
    let step_start = Instant::now();
    let partitions = split_partitions(&df, &config.label_column, config)?;
    print_shape("Train", partitions.train.height(), partitions.train.width());
    print_shape("Validation", partitions.val.height(), partitions.val.width());
    print_shape("Test", partitions.test.height(), partitions.test.width());

    let balance = partitions.class_balance(&config.label_column)?;
    summary.add_partition("Train", partitions.train.height(), balance.train);
    summary.add_partition("Val", partitions.val.height(), balance.val);
    summary.add_partition("Test", partitions.test.height(), balance.test);
    print_step_time(step_start.elapsed());

    // Step 4: Save
    print_step_header(4, "Save Partitions");
    let step_start = Instant::now();
    ensure_output_dir(&args.output_dir)?;

    let spinner = create_spinner("Writing partitions...");
    let Partitions {
        mut train,
        mut val,
        mut test,
    } = partitions;
    for (frame, file_name) in [
        (&mut train, TRAIN_FILE),
        (&mut val, VAL_FILE),
        (&mut test, TEST_FILE),
    ] {
        write_partition(frame, &args.output_dir, file_name)?;
    }
    finish_with_success(
        &spinner,
        &format!("Saved {}, {}, {} to {}", TRAIN_FILE, VAL_FILE, TEST_FILE, args.output_dir.display()),
    );
    print_step_time(step_start.elapsed());

    summary.set_elapsed(job_start.elapsed());
    summary.display();
    print_completion("Preprocessing complete!");

    Ok(summary)
}

/// Paths of the three partition files inside an output directory
pub fn partition_paths(output_dir: &Path) -> [PathBuf; 3] {
    [
        output_dir.join(TRAIN_FILE),
        output_dir.join(VAL_FILE),
        output_dir.join(TEST_FILE),
    ]
}

fn write_partition(df: &mut DataFrame, output_dir: &Path, file_name: &str) -> Result<()> {
    let path = output_dir.join(file_name);
    save_dataset(df, &path).with_context(|| format!("Failed to write {} partition", file_name))
}
