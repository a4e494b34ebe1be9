//! Feature preprocessing: scaling, column drops and row sampling
//!
//! The public functions are pure and return a new frame. Callers that want
//! to mutate an existing frame use the `*_in_place` variants instead.

use polars::prelude::*;

use super::loader::require_columns;
use crate::error::Result;
use crate::utils::print_info;

/// Seed used by `sample_dataframe` when the caller does not supply one
pub const DEFAULT_SAMPLE_SEED: u64 = 420;

/// Columns with at most this many distinct values are treated as indicators
const BINARY_MAX_UNIQUE: usize = 2;

/// Standardize continuous numeric columns to zero mean and unit variance.
///
/// The target column and any column with ≤2 distinct values are left
/// untouched. Mean and standard deviation are fitted on the same frame that
/// is transformed. When `enabled` is false the frame is returned as-is.
pub fn scale_variables(df: &DataFrame, target_column: &str, enabled: bool) -> Result<DataFrame> {
    let mut out = df.clone();
    if enabled {
        scale_variables_in_place(&mut out, target_column)?;
    }
    Ok(out)
}

/// In-place variant of [`scale_variables`]. Returns the names of the columns
/// that were scaled.
pub fn scale_variables_in_place(df: &mut DataFrame, target_column: &str) -> Result<Vec<String>> {
    let to_scale = get_scalable_columns(df, target_column)?;

    for name in &to_scale {
        let scaled = standardize_column(df.column(name)?)?;
        df.with_column(scaled)?;
    }

    Ok(to_scale)
}

/// Numeric, non-target columns with more than two distinct values
pub fn get_scalable_columns(df: &DataFrame, target_column: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for col in df.get_columns() {
        if !col.dtype().is_primitive_numeric() || col.name().as_str() == target_column {
            continue;
        }
        if col.as_materialized_series().n_unique()? > BINARY_MAX_UNIQUE {
            names.push(col.name().to_string());
        }
    }
    Ok(names)
}

/// Population z-score of a column. Nulls are skipped when fitting and stay
/// null. A zero-variance column keeps a scale of 1.0.
fn standardize_column(col: &Column) -> Result<Column> {
    let float_col = col.cast(&DataType::Float64)?;
    let ca = float_col.f64()?;

    let (sum, count) = ca
        .iter()
        .flatten()
        .fold((0.0f64, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        return Ok(float_col);
    }
    let mean = sum / count as f64;
    let variance = ca
        .iter()
        .flatten()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / count as f64;
    let std = variance.sqrt();
    let scale = if std == 0.0 { 1.0 } else { std };

    let values: Vec<Option<f64>> = ca.iter().map(|v| v.map(|x| (x - mean) / scale)).collect();
    Ok(Column::new(col.name().clone(), values))
}

/// Drop the named columns. Fails with `MissingColumn` before anything is
/// removed if any name is absent.
pub fn drop_columns<S: AsRef<str>>(df: &DataFrame, column_names: &[S]) -> Result<DataFrame> {
    require_columns(df, column_names)?;

    let mut out = df.clone();
    for name in column_names {
        out = out.drop(name.as_ref())?;
    }
    Ok(out)
}

/// In-place variant of [`drop_columns`]
pub fn drop_columns_in_place<S: AsRef<str>>(df: &mut DataFrame, column_names: &[S]) -> Result<()> {
    require_columns(df, column_names)?;

    for name in column_names {
        df.drop_in_place(name.as_ref())?;
    }
    Ok(())
}

/// Draw `sample_size` rows uniformly without replacement.
///
/// Returns the frame unchanged when sampling is disabled or when
/// `sample_size` is not smaller than the row count (the latter prints a
/// notice). `seed` defaults to [`DEFAULT_SAMPLE_SEED`].
pub fn sample_dataframe(
    df: &DataFrame,
    sample_size: usize,
    enabled: bool,
    seed: Option<u64>,
) -> Result<DataFrame> {
    if !enabled {
        return Ok(df.clone());
    }

    if sample_size >= df.height() {
        print_info(&format!(
            "Sample size {} is not smaller than the {} rows in the dataframe. Returning the original dataframe.",
            sample_size,
            df.height()
        ));
        return Ok(df.clone());
    }

    let seed = seed.unwrap_or(DEFAULT_SAMPLE_SEED);
    Ok(df.sample_n_literal(sample_size, false, false, Some(seed))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrepError;

    fn sample_frame() -> DataFrame {
        df! {
            "price" => [10.0f64, 20.0, 30.0, 40.0],
            "flag" => [0i32, 1, 0, 1],
            "loss" => [100.0f64, 250.0, 175.0, 320.0],
            "county" => ["a", "b", "c", "d"],
        }
        .unwrap()
    }

    #[test]
    fn test_get_scalable_columns_excludes_target_binary_and_strings() {
        let df = sample_frame();
        let cols = get_scalable_columns(&df, "loss").unwrap();
        assert_eq!(cols, vec!["price".to_string()]);
    }

    #[test]
    fn test_standardize_population_std() {
        let col = Column::new("x".into(), [1.0f64, 2.0, 3.0]);
        let out = standardize_column(&col).unwrap();
        let values: Vec<f64> = out.f64().unwrap().into_no_null_iter().collect();
        // population std of [1,2,3] is sqrt(2/3)
        let std = (2.0f64 / 3.0).sqrt();
        assert!((values[0] + 1.0 / std).abs() < 1e-12);
        assert!(values[1].abs() < 1e-12);
        assert!((values[2] - 1.0 / std).abs() < 1e-12);
    }

    #[test]
    fn test_standardize_keeps_nulls() {
        let col = Column::new("x".into(), [Some(1.0f64), None, Some(3.0), Some(5.0)]);
        let out = standardize_column(&col).unwrap();
        assert_eq!(out.null_count(), 1);
        assert!(out.f64().unwrap().get(1).is_none());
    }

    #[test]
    fn test_scale_disabled_is_identity() {
        let df = sample_frame();
        let out = scale_variables(&df, "loss", false).unwrap();
        assert!(out.equals_missing(&df));
    }

    #[test]
    fn test_drop_columns_all_or_nothing() {
        let df = sample_frame();
        let err = drop_columns(&df, &["flag", "nope"]).unwrap_err();
        assert!(matches!(err, PrepError::MissingColumn { ref column, .. } if column == "nope"));

        let mut df = sample_frame();
        assert!(drop_columns_in_place(&mut df, &["flag", "nope"]).is_err());
        assert_eq!(df.width(), 4, "No column should be removed on failure");
    }
}
