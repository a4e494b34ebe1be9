//! Integration tests for scaling, column drops and sampling

use geoprep::pipeline::{
    drop_columns, drop_columns_in_place, get_scalable_columns, sample_dataframe,
    scale_variables, scale_variables_in_place,
};
use geoprep::PrepError;
use polars::prelude::*;
use std::collections::HashSet;

#[path = "common/mod.rs"]
mod common;

use common::create_loss_dataframe;

#[test]
fn test_scale_leaves_target_binary_and_strings() {
    let df = create_loss_dataframe();
    let scaled = scale_variables(&df, "loss", true).unwrap();

    for name in ["loss", "flag", "county"] {
        assert!(
            scaled
                .column(name)
                .unwrap()
                .as_materialized_series()
                .equals_missing(df.column(name).unwrap().as_materialized_series()),
            "'{}' should be unchanged",
            name
        );
    }
    assert_eq!(
        get_scalable_columns(&df, "loss").unwrap(),
        vec!["price".to_string(), "area".to_string()]
    );
}

#[test]
fn test_scaled_columns_have_zero_mean_unit_variance() {
    let df = create_loss_dataframe();
    let scaled = scale_variables(&df, "loss", true).unwrap();

    for name in ["price", "area"] {
        let values: Vec<f64> = scaled.column(name).unwrap().f64().unwrap().into_no_null_iter().collect();
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 1e-9, "{} mean should be 0, got {}", name, mean);
        assert!((variance - 1.0).abs() < 1e-9, "{} variance should be 1, got {}", name, variance);
    }
}

#[test]
fn test_scale_is_pure_and_in_place_mutates() {
    let original = create_loss_dataframe();
    let _ = scale_variables(&original, "loss", true).unwrap();
    assert!(original.equals_missing(&create_loss_dataframe()), "Input must not change");

    let mut df = create_loss_dataframe();
    let scaled = scale_variables_in_place(&mut df, "loss").unwrap();
    assert_eq!(scaled, vec!["price".to_string(), "area".to_string()]);
    assert_eq!(df.column("area").unwrap().dtype(), &DataType::Float64);
}

#[test]
fn test_constant_column_is_not_scaled() {
    let df = df! {
        "y" => [1.0f64, 2.0, 3.0],
        "constant" => [7.0f64, 7.0, 7.0],
    }
    .unwrap();
    let scaled = scale_variables(&df, "y", true).unwrap();
    assert!(scaled.equals_missing(&df));
}

#[test]
fn test_drop_columns() {
    let df = create_loss_dataframe();
    let out = drop_columns(&df, &["flag", "county"]).unwrap();
    assert_eq!(out.width(), 3);
    assert_eq!(df.width(), 5, "Pure variant leaves the input alone");

    let mut df = create_loss_dataframe();
    drop_columns_in_place(&mut df, &["price"]).unwrap();
    assert!(df.column("price").is_err());
}

#[test]
fn test_drop_missing_column_fails_without_partial_drop() {
    let mut df = create_loss_dataframe();
    let err = drop_columns_in_place(&mut df, &["price", "missing_col"]).unwrap_err();
    assert!(matches!(err, PrepError::MissingColumn { ref column, .. } if column == "missing_col"));
    assert!(df.column("price").is_ok());
}

#[test]
fn test_sample_exact_size_without_duplicates() {
    let df = df! { "id" => (0..100i64).collect::<Vec<_>>() }.unwrap();
    let sampled = sample_dataframe(&df, 25, true, Some(42)).unwrap();

    assert_eq!(sampled.height(), 25);
    let ids: HashSet<i64> = sampled.column("id").unwrap().i64().unwrap().into_no_null_iter().collect();
    assert_eq!(ids.len(), 25, "Sampling is without replacement");
    assert!(ids.iter().all(|id| (0..100).contains(id)));
}

#[test]
fn test_sample_is_reproducible_with_default_seed() {
    let df = df! { "id" => (0..100i64).collect::<Vec<_>>() }.unwrap();
    let a = sample_dataframe(&df, 10, true, None).unwrap();
    let b = sample_dataframe(&df, 10, true, None).unwrap();
    assert!(a.equals_missing(&b));
}

#[test]
fn test_sample_larger_than_table_returns_original() {
    let df = create_loss_dataframe();
    let out = sample_dataframe(&df, 8, true, None).unwrap();
    assert!(out.equals_missing(&df));
    let out = sample_dataframe(&df, 1_000, true, None).unwrap();
    assert!(out.equals_missing(&df));
}

#[test]
fn test_sample_disabled_returns_original() {
    let df = create_loss_dataframe();
    let out = sample_dataframe(&df, 2, false, None).unwrap();
    assert!(out.equals_missing(&df));
}
