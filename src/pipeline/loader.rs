//! Dataset loader and writer for CSV files

use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;

/// Load a CSV dataset with a header row into memory.
///
/// `infer_schema_length` of 0 scans the whole file for type inference.
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if extension != "csv" {
        anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv",
            extension
        );
    }

    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(schema_length)
        .finish()
        .with_context(|| format!("Failed to load CSV file: {}", path.display()))?
        .collect()
        .with_context(|| format!("Failed to parse CSV file: {}", path.display()))?;

    Ok(df)
}

/// Write a dataset to CSV with a header row
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    Ok(())
}

/// Create the output directory (and parents) if it does not exist yet
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))
}

/// Column names of a DataFrame as owned strings
pub fn get_column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Fail with the list of available columns when `name` is absent
pub fn require_column(df: &DataFrame, name: &str) -> Result<()> {
    let columns = get_column_names(df);
    if !columns.iter().any(|c| c == name) {
        anyhow::bail!(
            "Column '{}' not found in dataset. Available columns: {:?}",
            name,
            columns
        );
    }
    Ok(())
}
