//! Numeric cleaning: coercion of text columns and median imputation

use anyhow::{Context, Result};
use polars::prelude::*;

/// Convert a column to Float64 in place.
///
/// Text values are trimmed and parsed; blanks and anything unparseable become null.
/// Returns the number of nulls in the coerced column.
pub fn coerce_numeric(df: &mut DataFrame, column: &str) -> Result<usize> {
    let col = df
        .column(column)
        .with_context(|| format!("Column '{}' not found", column))?;

    let values: Vec<Option<f64>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_number))
            .collect(),
        dtype if dtype.is_primitive_numeric() => {
            col.cast(&DataType::Float64)?.f64()?.into_iter().collect()
        }
        _ => {
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.and_then(parse_number))
                .collect()
        }
    };

    let null_count = values.iter().filter(|v| v.is_none()).count();
    df.with_column(Column::new(column.into(), values))?;

    Ok(null_count)
}

/// Fill nulls in a numeric column with the median of its non-null values.
///
/// The median is taken over every row of `df`, so calling this before the
/// partition split shares statistics across train, validation and test.
/// Returns the median used, or `None` when the column has no values at all.
pub fn impute_median(df: &mut DataFrame, column: &str) -> Result<Option<f64>> {
    let col = df
        .column(column)
        .with_context(|| format!("Column '{}' not found", column))?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", column))?;

    let ca = col.f64()?;
    let median = match ca.median() {
        Some(m) => m,
        None => return Ok(None),
    };

    let filled: Vec<f64> = ca.into_iter().map(|v| v.unwrap_or(median)).collect();
    df.with_column(Column::new(column.into(), filled))?;

    Ok(Some(median))
}

fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
