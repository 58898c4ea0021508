//! Feature matrix and label vector extraction from an encoded partition

use anyhow::{Context, Result};
use faer::Mat;
use polars::prelude::*;

use crate::pipeline::{label_values, require_column};

/// Numeric design matrix with its column schema and 0/1 labels
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub feature_names: Vec<String>,
    /// `n_rows x n_features`
    pub x: Mat<f64>,
    pub y: Vec<i64>,
}

impl FeatureSet {
    /// Build from a partition, using every column except the label and the id.
    ///
    /// The id column is dropped when present and ignored otherwise. Every
    /// remaining column must be numeric (or boolean) and free of nulls.
    pub fn from_frame(df: &DataFrame, label: &str, id: &str) -> Result<Self> {
        require_column(df, label)?;

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .filter(|name| name != label && name != id)
            .collect();

        Self::build(df, label, names)
    }

    /// Build with exactly the given feature columns, in the given order.
    ///
    /// Used for validation data, which must match the training schema.
    pub fn aligned_to(df: &DataFrame, label: &str, id: &str, feature_names: &[String]) -> Result<Self> {
        require_column(df, label)?;

        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .filter(|name| name != label && name != id)
            .collect();

        let missing: Vec<&String> = feature_names.iter().filter(|f| !present.contains(f)).collect();
        let extra: Vec<&String> = present.iter().filter(|p| !feature_names.contains(p)).collect();

        if !missing.is_empty() || !extra.is_empty() {
            anyhow::bail!(
                "Feature columns do not match the training schema. Missing: {:?}, unexpected: {:?}",
                missing,
                extra
            );
        }

        Self::build(df, label, feature_names.to_vec())
    }

    pub fn n_rows(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    fn build(df: &DataFrame, label: &str, feature_names: Vec<String>) -> Result<Self> {
        let non_numeric: Vec<String> = feature_names
            .iter()
            .filter(|name| {
                df.column(name)
                    .map(|col| {
                        let dtype = col.dtype();
                        !(dtype.is_primitive_numeric() || dtype == &DataType::Boolean)
                    })
                    .unwrap_or(true)
            })
            .cloned()
            .collect();

        if !non_numeric.is_empty() {
            anyhow::bail!(
                "All features must be numeric after encoding; found non-numeric column(s): {:?}",
                non_numeric
            );
        }

        let y = label_values(df, label)?;
        if let Some(bad) = y.iter().find(|&&l| l != 0 && l != 1) {
            anyhow::bail!("Label column '{}' must be 0/1, found value {}", label, bad);
        }

        let n_rows = df.height();
        let mut x = Mat::<f64>::zeros(n_rows, feature_names.len());

        for (col_idx, name) in feature_names.iter().enumerate() {
            let col = df
                .column(name)?
                .cast(&DataType::Float64)
                .with_context(|| format!("Failed to cast feature '{}' to Float64", name))?;

            for (row_idx, value) in col.f64()?.into_iter().enumerate() {
                match value {
                    Some(v) => x[(row_idx, col_idx)] = v,
                    None => anyhow::bail!("Feature '{}' contains null values", name),
                }
            }
        }

        Ok(Self {
            feature_names,
            x,
            y,
        })
    }
}
