//! Categorical encoding: Yes/No binarization and indicator columns

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use polars::prelude::*;

/// Map each listed column to Int32 1 (`"Yes"`) / 0 (anything else).
///
/// Nulls and unexpected values map to 0 without error.
pub fn binarize_yes_no(df: &mut DataFrame, columns: &[String]) -> Result<()> {
    for name in columns {
        let col = df
            .column(name)
            .with_context(|| format!("Binary column '{}' not found", name))?;

        let as_text = if col.dtype() == &DataType::String {
            col.clone()
        } else {
            col.cast(&DataType::String)?
        };

        let values: Vec<i32> = as_text
            .str()?
            .into_iter()
            .map(|v| i32::from(v == Some("Yes")))
            .collect();

        df.with_column(Column::new(name.as_str().into(), values))?;
    }

    Ok(())
}

/// String-typed columns, in frame order, except the excluded ones
pub fn categorical_columns(df: &DataFrame, exclude: &[&str]) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| col.dtype() == &DataType::String)
        .map(|col| col.name().to_string())
        .filter(|name| !exclude.contains(&name.as_str()))
        .collect()
}

/// Replace each categorical column by 0/1 indicator columns.
///
/// One indicator `<column>_<value>` per distinct non-null value in lexicographic
/// order, with the first value dropped as the reference category. Indicators are
/// appended after the remaining columns. Returns the added column names.
pub fn one_hot_encode(df: &mut DataFrame, columns: &[String]) -> Result<Vec<String>> {
    let mut indicators: Vec<Column> = Vec::new();

    for name in columns {
        let col = df
            .column(name)
            .with_context(|| format!("Categorical column '{}' not found", name))?
            .cast(&DataType::String)?;
        let ca = col.str()?;

        let categories: BTreeSet<&str> = ca.into_iter().flatten().collect();

        for category in categories.iter().skip(1) {
            let values: Vec<i32> = ca
                .into_iter()
                .map(|v| i32::from(v == Some(*category)))
                .collect();
            indicators.push(Column::new(
                format!("{}_{}", name, category).into(),
                values,
            ));
        }
    }

    let mut encoded = df.drop_many(columns);
    let added: Vec<String> = indicators.iter().map(|c| c.name().to_string()).collect();
    for indicator in indicators {
        encoded
            .with_column(indicator)
            .context("Indicator column clashes with an existing column")?;
    }

    *df = encoded;
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binarize_unexpected_values_map_to_zero() {
        let mut df = df! {
            "Partner" => [Some("Yes"), Some("No"), Some("Maybe"), None, Some("yes")],
        }
        .unwrap();

        binarize_yes_no(&mut df, &["Partner".to_string()]).unwrap();

        let values: Vec<Option<i32>> = df.column("Partner").unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1), Some(0), Some(0), Some(0), Some(0)]);
    }

    #[test]
    fn test_binarize_missing_column_errors() {
        let mut df = df! { "Partner" => ["Yes"] }.unwrap();
        let result = binarize_yes_no(&mut df, &["Dependents".to_string()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_categorical_columns_skip_id_and_numeric() {
        let df = df! {
            "customerID" => ["a", "b"],
            "gender" => ["Male", "Female"],
            "tenure" => [1i32, 2],
            "Contract" => ["One year", "Two year"],
        }
        .unwrap();

        let cats = categorical_columns(&df, &["customerID"]);
        assert_eq!(cats, vec!["gender", "Contract"]);
    }

    #[test]
    fn test_one_hot_drops_first_sorted_category() {
        let mut df = df! {
            "tenure" => [1i32, 2, 3, 4],
            "Contract" => ["Two year", "Month-to-month", "One year", "Month-to-month"],
        }
        .unwrap();

        let added = one_hot_encode(&mut df, &["Contract".to_string()]).unwrap();
        assert_eq!(added, vec!["Contract_One year", "Contract_Two year"]);

        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["tenure", "Contract_One year", "Contract_Two year"]);

        let one_year: Vec<Option<i32>> = df.column("Contract_One year").unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(one_year, vec![Some(0), Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn test_one_hot_null_category_is_all_zero() {
        let mut df = df! {
            "color" => [Some("red"), None, Some("blue")],
        }
        .unwrap();

        one_hot_encode(&mut df, &["color".to_string()]).unwrap();
        let red: Vec<Option<i32>> = df.column("color_red").unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(red, vec![Some(1), Some(0), Some(0)]);
        assert!(df.column("color_blue").is_err());
    }

    #[test]
    fn test_one_hot_single_category_adds_nothing() {
        let mut df = df! {
            "x" => [1i32, 2],
            "constant" => ["same", "same"],
        }
        .unwrap();

        let added = one_hot_encode(&mut df, &["constant".to_string()]).unwrap();
        assert!(added.is_empty());
        assert_eq!(df.width(), 1);
    }
}
