//! Incremental feature selection
//!
//! Each candidate column is appended to the base features on its own and
//! scored by 2-fold cross-validated mean absolute error. The candidate with
//! the lowest error wins; ties go to the earlier column.

use faer::Mat;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::estimator::{
    cross_val_mae, AdaBoostRegressor, RandomForestRegressor, Regressor, RegressorFactory,
    DEFAULT_FOLDS,
};
use super::loader::column_names;
use crate::error::{PrepError, Result};
use crate::utils::{print_info, print_success};

/// Estimator family used to score candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionStrategy {
    /// 100 bootstrap trees, depth ≤ 40, seed 420
    #[default]
    #[serde(rename = "rf", alias = "random_forest")]
    RandomForest,
    /// AdaBoost.R2, 100 rounds at learning rate 0.1, seed 420
    #[serde(rename = "ada", alias = "adaboost")]
    AdaBoost,
}

impl SelectionStrategy {
    /// A fresh, unfitted estimator with the standard settings
    pub fn build(&self) -> Box<dyn Regressor> {
        match self {
            SelectionStrategy::RandomForest => Box::new(RandomForestRegressor::default()),
            SelectionStrategy::AdaBoost => Box::new(AdaBoostRegressor::default()),
        }
    }
}

impl std::fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionStrategy::RandomForest => write!(f, "rf"),
            SelectionStrategy::AdaBoost => write!(f, "ada"),
        }
    }
}

impl std::str::FromStr for SelectionStrategy {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "rf" | "random_forest" | "randomforest" => Ok(SelectionStrategy::RandomForest),
            "ada" | "adaboost" => Ok(SelectionStrategy::AdaBoost),
            _ => Err(PrepError::Configuration(format!(
                "Unknown selection strategy: '{}'. Use 'rf' or 'ada'",
                s
            ))),
        }
    }
}

/// Cross-validated error of one candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    pub column: String,
    /// Mean of `fold_errors`
    pub error: f64,
    pub fold_errors: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionOutcome {
    pub best_column: String,
    pub best_error: f64,
    /// Every candidate in evaluation order
    pub scores: Vec<CandidateScore>,
}

/// Score every candidate with the strategy's estimator and return the best
pub fn select_best_feature(
    base_features: &DataFrame,
    candidates: &DataFrame,
    target: &[f64],
    strategy: SelectionStrategy,
) -> Result<SelectionOutcome> {
    let factory = move || strategy.build();
    select_best_feature_with(base_features, candidates, target, &factory)
}

/// Same as [`select_best_feature`] with a caller-supplied estimator factory.
/// The factory is called once per fold.
pub fn select_best_feature_with(
    base_features: &DataFrame,
    candidates: &DataFrame,
    target: &[f64],
    factory: RegressorFactory<'_>,
) -> Result<SelectionOutcome> {
    let n_rows = target.len();
    if base_features.height() != n_rows {
        return Err(PrepError::ShapeMismatch {
            what: "base features".to_string(),
            expected: n_rows,
            actual: base_features.height(),
        });
    }
    if candidates.width() == 0 {
        return Err(PrepError::EmptyCandidateSet);
    }
    if candidates.height() != n_rows {
        return Err(PrepError::ShapeMismatch {
            what: "candidate table".to_string(),
            expected: n_rows,
            actual: candidates.height(),
        });
    }
    if let Some(bad) = target.iter().position(|v| !v.is_finite()) {
        return Err(PrepError::conversion("target", target[bad], "target values must be finite"));
    }

    // Base columns are written once; the last column is overwritten per candidate
    let n_base = base_features.width();
    let mut x = Mat::<f64>::zeros(n_rows, n_base + 1);
    for (col_idx, col) in base_features.get_columns().iter().enumerate() {
        for (row, value) in numeric_values(col)?.into_iter().enumerate() {
            x[(row, col_idx)] = value;
        }
    }

    let mut scores = Vec::with_capacity(candidates.width());
    for col in candidates.get_columns() {
        for (row, value) in numeric_values(col)?.into_iter().enumerate() {
            x[(row, n_base)] = value;
        }

        let fold_errors = cross_val_mae(factory, &x, target, DEFAULT_FOLDS)?;
        let error = fold_errors.iter().sum::<f64>() / fold_errors.len() as f64;
        print_info(&format!("Candidate '{}': mean absolute error {:.6}", col.name(), error));

        scores.push(CandidateScore {
            column: col.name().to_string(),
            error,
            fold_errors,
        });
    }

    let best = best_score(&scores).ok_or(PrepError::EmptyCandidateSet)?;
    print_success(&format!(
        "Best feature: '{}' with mean absolute error {:.6}",
        best.column, best.error
    ));

    Ok(SelectionOutcome {
        best_column: best.column.clone(),
        best_error: best.error,
        scores,
    })
}

/// Stable argmin: the first of equally good candidates wins
fn best_score(scores: &[CandidateScore]) -> Option<&CandidateScore> {
    scores.iter().fold(None, |best: Option<&CandidateScore>, score| match best {
        Some(b) if b.error <= score.error => Some(b),
        _ => Some(score),
    })
}

/// Target values of `column` as `f64`. Nulls and non-finite values are
/// conversion faults.
pub fn target_values(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
    let col = df
        .column(column)
        .map_err(|_| PrepError::missing_column(column, column_names(df)))?;
    numeric_values(col)
}

fn numeric_values(col: &Column) -> Result<Vec<f64>> {
    let dtype = col.dtype();
    if !dtype.is_primitive_numeric() && !matches!(dtype, DataType::Boolean) {
        return Err(PrepError::conversion(
            col.name().as_str(),
            dtype,
            "feature columns must be numeric",
        ));
    }

    let as_float = col.cast(&DataType::Float64)?;
    as_float
        .f64()?
        .iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) if v.is_finite() => Ok(v),
            Some(v) => Err(PrepError::conversion(
                col.name().as_str(),
                v,
                format!("non-finite value at row {}", row),
            )),
            None => Err(PrepError::conversion(
                col.name().as_str(),
                "null",
                format!("missing value at row {}", row),
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(column: &str, error: f64) -> CandidateScore {
        CandidateScore {
            column: column.to_string(),
            error,
            fold_errors: vec![error, error],
        }
    }

    #[test]
    fn test_best_score_is_stable() {
        let scores = vec![score("a", 2.0), score("b", 1.0), score("c", 1.0)];
        assert_eq!(best_score(&scores).unwrap().column, "b");
        assert!(best_score(&[]).is_none());
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("rf".parse::<SelectionStrategy>().unwrap(), SelectionStrategy::RandomForest);
        assert_eq!("ADA".parse::<SelectionStrategy>().unwrap(), SelectionStrategy::AdaBoost);
        assert!("svm".parse::<SelectionStrategy>().is_err());

        let strategy: SelectionStrategy = serde_json::from_str("\"ada\"").unwrap();
        assert_eq!(strategy, SelectionStrategy::AdaBoost);
        assert_eq!(serde_json::to_string(&SelectionStrategy::RandomForest).unwrap(), "\"rf\"");
    }

    #[test]
    fn test_numeric_values_rejects_nulls_and_strings() {
        let col = Column::new("x".into(), [Some(1.0f64), None]);
        assert!(matches!(
            numeric_values(&col),
            Err(PrepError::DataConversion { ref column, .. }) if column == "x"
        ));

        let col = Column::new("s".into(), ["a", "b"]);
        assert!(numeric_values(&col).is_err());

        let col = Column::new("i".into(), [1i32, 2]);
        assert_eq!(numeric_values(&col).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_nan_feature_is_conversion_fault() {
        let nan = f64::NAN;
        let base = df! { "b" => [1.0f64, 2.0, 3.0, nan, 1.0, 2.0, 3.0, nan] }.unwrap();
        let candidates = df! { "c" => [0.0f64; 8] }.unwrap();
        let target = [0.0, 0.0, 0.0, 100.0, 0.0, 0.0, 0.0, 100.0];

        let result = select_best_feature(&base, &candidates, &target, SelectionStrategy::AdaBoost);
        assert!(matches!(
            result,
            Err(PrepError::DataConversion { ref column, .. }) if column == "b"
        ));

        let base = df! { "b" => [1.0f64; 8] }.unwrap();
        let candidates = df! { "c" => [0.0f64, 1.0, f64::INFINITY, 3.0, 4.0, 5.0, 6.0, 7.0] }.unwrap();
        let result = select_best_feature(&base, &candidates, &target, SelectionStrategy::RandomForest);
        assert!(matches!(
            result,
            Err(PrepError::DataConversion { ref column, .. }) if column == "c"
        ));
    }

    #[test]
    fn test_target_values_missing_column() {
        let df = df! { "a" => [1.0f64] }.unwrap();
        assert!(matches!(
            target_values(&df, "loss"),
            Err(PrepError::MissingColumn { .. })
        ));
    }
}
