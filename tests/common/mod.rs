//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Loss records with continuous, binary and string columns
///
/// - `loss`: target
/// - `price`, `area`: continuous features (scaled)
/// - `flag`: binary indicator (never scaled)
/// - `county`: string code (never scaled)
pub fn create_loss_dataframe() -> DataFrame {
    df! {
        "loss" => [120.0f64, 340.0, 95.0, 410.0, 230.0, 180.0, 275.0, 60.0],
        "price" => [10.0f64, 25.0, 8.0, 31.0, 19.0, 14.0, 22.0, 5.0],
        "area" => [1i64, 3, 2, 5, 4, 2, 3, 1],
        "flag" => [0i32, 1, 0, 1, 1, 0, 1, 0],
        "county" => ["001", "003", "001", "005", "003", "001", "005", "007"],
    }
    .unwrap()
}

/// Year-of-loss records with one exact duplicate row (rows 0 and 3)
pub fn create_year_dataframe() -> DataFrame {
    df! {
        "policy" => ["a", "b", "c", "a", "d"],
        "yearOfLoss" => [1985i64, 1999, 2011, 1985, 2021],
    }
    .unwrap()
}

/// Selection fixture: `n` rows, one weak base feature, a target that is not
/// ordered by row, and candidates `copy` (equal to the target) and `noise`
pub fn create_selection_fixture(n: usize, seed: u64) -> (DataFrame, DataFrame, Vec<f64>) {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(seed);
    let target: Vec<f64> = (0..n).map(|i| ((i * 37) % 50) as f64).collect();
    let base: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..1.0)).collect();
    let noise: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..50.0)).collect();

    let base = df! { "base_0" => base }.unwrap();
    let candidates = df! {
        "noise" => noise,
        "copy" => target.clone(),
    }
    .unwrap();

    (base, candidates, target)
}

/// A geometry partition with `ids` and a square polygon per row
pub fn create_geometry_frame(id_column: &str, ids: &[i64]) -> DataFrame {
    let wkt: Vec<String> = ids
        .iter()
        .map(|&id| {
            let x = id as f64;
            format!("POLYGON (({x} 0, {} 0, {} 1, {x} 1, {x} 0))", x + 1.0, x + 1.0)
        })
        .collect();
    DataFrame::new(vec![
        Column::new(id_column.into(), ids.to_vec()),
        Column::new("geometry".into(), wkt),
    ])
    .unwrap()
}

/// Write a frame to `dir/name` in the format implied by the extension
pub fn write_frame(dir: &Path, name: &str, df: &mut DataFrame) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    if name.ends_with(".csv") {
        let mut file = file;
        CsvWriter::new(&mut file).finish(df).unwrap();
    } else {
        ParquetWriter::new(file).finish(df).unwrap();
    }
    path
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = write_frame(temp_dir.path(), "test_data.csv", df);
    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = write_frame(temp_dir.path(), "test_data.parquet", df);
    (temp_dir, parquet_path)
}

/// Base path prefix (`dir/`) for a geometry source directory
pub fn base_path_of(dir: &Path) -> String {
    format!("{}/", dir.display())
}
