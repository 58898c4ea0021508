//! Stratified train/validation/test partitioning
//!
//! Rows are split in two stages, each preserving the label distribution:
//! the test partition is carved from all rows, then the validation partition
//! from what remains. Every stage draws from a fresh `ChaCha8Rng` seeded with
//! the configured seed, so identical input always yields identical partitions.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::config::PreprocessConfig;

/// The three disjoint partitions of the cleaned dataset
#[derive(Debug, Clone)]
pub struct Partitions {
    pub train: DataFrame,
    pub val: DataFrame,
    pub test: DataFrame,
}

/// Share of positive labels per partition
#[derive(Debug, Clone, Copy)]
pub struct ClassBalance {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl Partitions {
    /// Total number of rows across all partitions
    pub fn total_rows(&self) -> usize {
        self.train.height() + self.val.height() + self.test.height()
    }

    /// Positive-class rate of each partition
    pub fn class_balance(&self, label: &str) -> Result<ClassBalance> {
        Ok(ClassBalance {
            train: positive_rate(&self.train, label)?,
            val: positive_rate(&self.val, label)?,
            test: positive_rate(&self.test, label)?,
        })
    }
}

/// Split row indices into `(rest, test)` preserving class proportions.
///
/// `ceil(test_fraction * n)` rows go to test. Each class contributes
/// `floor(n_class * n_test / n)` rows, and the slots left over go to the classes
/// with the largest fractional remainder (ties to the lower label).
pub fn stratified_split(
    labels: &[i64],
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
        anyhow::bail!(
            "Split fraction must be between 0 and 1 (exclusive), got {}",
            test_fraction
        );
    }

    let n = labels.len();
    // The epsilon keeps products like 170 * (0.15 / 0.85) = 30.000000000000004 at 30
    let n_test = (test_fraction * n as f64 - 1e-9).ceil() as usize;
    if n_test == 0 || n_test >= n {
        anyhow::bail!(
            "Cannot split {} row(s) with fraction {}: both sides need at least one row",
            n,
            test_fraction
        );
    }

    let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(idx);
    }

    if let Some((label, members)) = by_class.iter().find(|(_, m)| m.len() < 2) {
        anyhow::bail!(
            "The least populated class ({}) has only {} member(s); stratified splitting needs at least 2",
            label,
            members.len()
        );
    }

    let quotas = allocate_quotas(&by_class, n, n_test);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rest = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);

    for (members, quota) in by_class.values_mut().zip(quotas) {
        members.shuffle(&mut rng);
        test.extend_from_slice(&members[..quota]);
        rest.extend_from_slice(&members[quota..]);
    }

    rest.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Ok((rest, test))
}

/// Per-class test quotas summing to `n_test`, in ascending label order
fn allocate_quotas(by_class: &BTreeMap<i64, Vec<usize>>, n: usize, n_test: usize) -> Vec<usize> {
    let mut quotas: Vec<usize> = Vec::with_capacity(by_class.len());
    let mut remainders: Vec<(usize, f64)> = Vec::with_capacity(by_class.len());

    for (i, members) in by_class.values().enumerate() {
        let exact = members.len() as f64 * n_test as f64 / n as f64;
        let floor = exact.floor() as usize;
        quotas.push(floor);
        remainders.push((i, exact - floor as f64));
    }

    let assigned: usize = quotas.iter().sum();
    let leftover = n_test.saturating_sub(assigned);

    // Stable sort keeps the lower label first on equal remainders
    remainders.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    for &(i, _) in remainders.iter().take(leftover) {
        quotas[i] += 1;
    }

    quotas
}

/// Read a 0/1 label column as integers; nulls are an error
pub fn label_values(df: &DataFrame, label: &str) -> Result<Vec<i64>> {
    let col = df
        .column(label)
        .with_context(|| format!("Label column '{}' not found", label))?
        .cast(&DataType::Int64)
        .with_context(|| format!("Label column '{}' is not numeric", label))?;

    let labels: Option<Vec<i64>> = col.i64()?.into_iter().collect();
    labels.ok_or_else(|| anyhow::anyhow!("Label column '{}' contains null values", label))
}

/// Split a cleaned, encoded dataset into train/validation/test partitions
pub fn split_partitions(
    df: &DataFrame,
    label: &str,
    config: &PreprocessConfig,
) -> Result<Partitions> {
    let labels = label_values(df, label)?;

    let (rest_idx, test_idx) = stratified_split(&labels, config.test_fraction, config.seed)
        .context("Failed to carve the test partition")?;

    let rest_labels: Vec<i64> = rest_idx.iter().map(|&i| labels[i]).collect();
    let (train_pos, val_pos) =
        stratified_split(&rest_labels, config.val_fraction_of_rest(), config.seed)
            .context("Failed to carve the validation partition")?;

    let train_idx: Vec<usize> = train_pos.iter().map(|&p| rest_idx[p]).collect();
    let val_idx: Vec<usize> = val_pos.iter().map(|&p| rest_idx[p]).collect();

    Ok(Partitions {
        train: take_rows(df, &train_idx)?,
        val: take_rows(df, &val_idx)?,
        test: take_rows(df, &test_idx)?,
    })
}

fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = indices.iter().map(|&i| i as IdxSize).collect();
    let idx = IdxCa::from_vec("idx".into(), idx);
    Ok(df.take(&idx)?)
}

fn positive_rate(df: &DataFrame, label: &str) -> Result<f64> {
    let labels = label_values(df, label)?;
    if labels.is_empty() {
        return Ok(0.0);
    }
    let positives = labels.iter().filter(|&&l| l == 1).count();
    Ok(positives as f64 / labels.len() as f64)
}
