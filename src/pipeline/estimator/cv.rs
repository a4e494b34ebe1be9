//! Unshuffled k-fold cross-validation scored by mean absolute error

use faer::Mat;

use super::{select_rows, RegressorFactory};
use crate::error::{PrepError, Result};

/// Folds used when scoring candidate features
pub const DEFAULT_FOLDS: usize = 2;

/// A single train/test split
#[derive(Debug, Clone, PartialEq)]
pub struct FoldSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Contiguous, unshuffled folds. The first `n_samples % n_splits` folds hold
/// one extra row.
pub fn kfold_indices(n_samples: usize, n_splits: usize) -> Result<Vec<FoldSplit>> {
    if n_splits < 2 {
        return Err(PrepError::Configuration(
            "Cross-validation needs at least 2 folds".to_string(),
        ));
    }
    if n_samples < n_splits {
        return Err(PrepError::Configuration(format!(
            "Cannot split {} rows into {} folds",
            n_samples, n_splits
        )));
    }

    let base = n_samples / n_splits;
    let remainder = n_samples % n_splits;

    let mut splits = Vec::with_capacity(n_splits);
    let mut start = 0;
    for fold in 0..n_splits {
        let size = if fold < remainder { base + 1 } else { base };
        let end = start + size;
        splits.push(FoldSplit {
            train: (0..start).chain(end..n_samples).collect(),
            test: (start..end).collect(),
        });
        start = end;
    }

    Ok(splits)
}

pub fn mean_absolute_error(predicted: &[f64], actual: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Fit a fresh estimator per fold and return each fold's test MAE
pub fn cross_val_mae(
    factory: RegressorFactory<'_>,
    x: &Mat<f64>,
    y: &[f64],
    n_splits: usize,
) -> Result<Vec<f64>> {
    if x.nrows() != y.len() {
        return Err(PrepError::ShapeMismatch {
            what: "target".to_string(),
            expected: x.nrows(),
            actual: y.len(),
        });
    }

    kfold_indices(x.nrows(), n_splits)?
        .into_iter()
        .map(|split| {
            let x_train = select_rows(x, &split.train);
            let y_train: Vec<f64> = split.train.iter().map(|&i| y[i]).collect();
            let x_test = select_rows(x, &split.test);
            let y_test: Vec<f64> = split.test.iter().map(|&i| y[i]).collect();

            let mut model = factory();
            model.fit(&x_train, &y_train)?;
            let predicted = model.predict(&x_test)?;
            Ok(mean_absolute_error(&predicted, &y_test))
        })
        .collect()
}
