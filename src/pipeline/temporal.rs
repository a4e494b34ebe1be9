//! Year-of-loss binning into integer bucket codes

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Continuous year column the buckets are derived from
pub const YEAR_COLUMN: &str = "yearOfLoss";
/// Output column of the primary (1980-2021) scheme
pub const YEAR_BIN_COLUMN: &str = "yearOfLoss_1980_2021";
/// Output column of the custom zip-level scheme
pub const ZIP_YEAR_BIN_COLUMN: &str = "zip_year_bin";

/// Bin edges with one integer label per interval.
///
/// Intervals are left-closed and right-open: `[edges[i], edges[i + 1])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinScheme {
    pub edges: Vec<f64>,
    pub labels: Vec<i64>,
    /// Also place a value equal to the lowest edge in the first bin. With
    /// left-closed intervals that value already lands there.
    #[serde(default)]
    pub include_lowest: bool,
}

impl BinScheme {
    pub fn new(edges: Vec<f64>, labels: Vec<i64>) -> Self {
        Self {
            edges,
            labels,
            include_lowest: false,
        }
    }

    pub fn with_include_lowest(mut self, include_lowest: bool) -> Self {
        self.include_lowest = include_lowest;
        self
    }

    /// Check the label count and edge ordering
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.edges.len() != self.labels.len() + 1 {
            return Err(PrepError::Configuration(format!(
                "{}: number of bin labels must be one fewer than the number of bin edges (got {} edges, {} labels)",
                name,
                self.edges.len(),
                self.labels.len()
            )));
        }
        if self.edges.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(PrepError::Configuration(format!(
                "{}: bin edges must be strictly increasing, got {:?}",
                name, self.edges
            )));
        }
        Ok(())
    }

    /// Label of the interval containing `value`, if any
    pub fn label_for(&self, value: f64) -> Option<i64> {
        if self.include_lowest && self.edges.first() == Some(&value) {
            return self.labels.first().copied();
        }
        // number of edges <= value; the interval index is one less
        let idx = self.edges.partition_point(|&edge| edge <= value);
        if idx == 0 || idx >= self.edges.len() {
            return None;
        }
        self.labels.get(idx - 1).copied()
    }
}

impl Default for BinScheme {
    /// Five-year buckets from 1980 up to (but excluding) 2025, labelled 1..=9
    fn default() -> Self {
        let edges: Vec<f64> = (0..=9).map(|i| 1980.0 + 5.0 * i as f64).collect();
        let labels: Vec<i64> = (1..=9).collect();
        Self::new(edges, labels)
    }
}

/// Add `yearOfLoss_1980_2021` and `zip_year_bin` bucket codes, then drop
/// exact duplicate rows (first occurrence kept).
///
/// Both schemes are validated before the frame is touched. A year that is
/// null or falls outside every interval has no integer code and fails the
/// whole call.
pub fn process_year_of_loss(
    df: &DataFrame,
    year_scheme: &BinScheme,
    custom_scheme: &BinScheme,
) -> Result<DataFrame> {
    year_scheme.validate(YEAR_BIN_COLUMN)?;
    custom_scheme.validate(ZIP_YEAR_BIN_COLUMN)?;

    let years = df
        .column(YEAR_COLUMN)
        .map_err(|_| PrepError::missing_column(YEAR_COLUMN, super::column_names(df)))?
        .cast(&DataType::Float64)?;
    let years = years.f64()?;

    let year_bins = assign_bins(years, year_scheme, YEAR_BIN_COLUMN)?;
    let custom_bins = assign_bins(years, custom_scheme, ZIP_YEAR_BIN_COLUMN)?;

    let mut out = df.clone();
    out.with_column(Column::new(YEAR_BIN_COLUMN.into(), year_bins))?;
    out.with_column(Column::new(ZIP_YEAR_BIN_COLUMN.into(), custom_bins))?;

    Ok(out.unique_stable(None, UniqueKeepStrategy::First, None)?)
}

fn assign_bins(years: &Float64Chunked, scheme: &BinScheme, output: &str) -> Result<Vec<i64>> {
    years
        .iter()
        .map(|year| {
            let year = year.ok_or_else(|| {
                PrepError::conversion(output, "null", "year of loss is missing")
            })?;
            scheme.label_for(year).ok_or_else(|| {
                PrepError::conversion(
                    output,
                    year,
                    format!("year falls outside bin edges {:?}", scheme.edges),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_for_left_closed_right_open() {
        let scheme = BinScheme::new(vec![1980.0, 1990.0, 2000.0], vec![1, 2]);
        assert_eq!(scheme.label_for(1980.0), Some(1));
        assert_eq!(scheme.label_for(1989.9), Some(1));
        assert_eq!(scheme.label_for(1990.0), Some(2));
        assert_eq!(scheme.label_for(2000.0), None, "upper edge is open");
        assert_eq!(scheme.label_for(1979.0), None);
    }

    #[test]
    fn test_include_lowest_keeps_lowest_edge() {
        let scheme = BinScheme::new(vec![1980.0, 2000.0, 2022.0], vec![0, 1]).with_include_lowest(true);
        assert_eq!(scheme.label_for(1980.0), Some(0));
        assert_eq!(scheme.label_for(2021.0), Some(1));
    }

    #[test]
    fn test_validate_rejects_label_mismatch() {
        let scheme = BinScheme::new(vec![1980.0, 2000.0, 2022.0], vec![0, 1, 2]);
        let err = scheme.validate("zip_year_bin").unwrap_err();
        assert!(matches!(err, PrepError::Configuration(ref msg) if msg.contains("one fewer")));
    }

    #[test]
    fn test_validate_rejects_unsorted_edges() {
        let scheme = BinScheme::new(vec![2000.0, 1980.0], vec![0]);
        assert!(matches!(scheme.validate("x"), Err(PrepError::Configuration(_))));
    }

    #[test]
    fn test_default_scheme_is_valid() {
        let scheme = BinScheme::default();
        scheme.validate("default").unwrap();
        assert_eq!(scheme.label_for(2021.0), Some(9));
    }
}
