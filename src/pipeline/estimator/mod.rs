//! Regression estimators used to score candidate features
//!
//! All estimators minimise absolute error and are deterministic for a given
//! seed. Features are passed as a dense `faer::Mat<f64>` (rows × features).

pub mod adaboost;
pub mod cv;
pub mod forest;
pub mod tree;

use faer::Mat;

use crate::error::{PrepError, Result};

pub use adaboost::AdaBoostRegressor;
pub use cv::{cross_val_mae, kfold_indices, mean_absolute_error, DEFAULT_FOLDS};
pub use forest::RandomForestRegressor;
pub use tree::DecisionTreeRegressor;

/// Seed shared by the standard forest and boosting configurations
pub const DEFAULT_ESTIMATOR_SEED: u64 = 420;

/// A regressor that can be fitted on a feature matrix and a target
pub trait Regressor {
    /// Short name used in progress output
    fn name(&self) -> &'static str;

    fn fit(&mut self, x: &Mat<f64>, y: &[f64]) -> Result<()>;

    fn predict(&self, x: &Mat<f64>) -> Result<Vec<f64>>;
}

/// Builds a fresh, unfitted estimator for each cross-validation fold
pub type RegressorFactory<'a> = &'a dyn Fn() -> Box<dyn Regressor>;

/// Copy a row subset of `x` into a new matrix
pub fn select_rows(x: &Mat<f64>, rows: &[usize]) -> Mat<f64> {
    let mut out = Mat::<f64>::zeros(rows.len(), x.ncols());
    for (out_row, &row) in rows.iter().enumerate() {
        for col in 0..x.ncols() {
            out[(out_row, col)] = x[(row, col)];
        }
    }
    out
}

/// Column-major copy of `x`, the layout split searches scan
pub(crate) fn columns_of(x: &Mat<f64>) -> Vec<Vec<f64>> {
    (0..x.ncols())
        .map(|col| (0..x.nrows()).map(|row| x[(row, col)]).collect())
        .collect()
}

pub(crate) fn check_fit_shape(x: &Mat<f64>, y: &[f64]) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(PrepError::ShapeMismatch {
            what: "target".to_string(),
            expected: x.nrows(),
            actual: y.len(),
        });
    }
    if x.nrows() == 0 {
        return Err(PrepError::Configuration(
            "Cannot fit an estimator on zero rows".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn check_predict_shape(x: &Mat<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(PrepError::Configuration(format!(
            "Estimator was fitted on {} features but received {}",
            n_features,
            x.ncols()
        )));
    }
    Ok(())
}

pub(crate) fn not_fitted(name: &str) -> PrepError {
    PrepError::Configuration(format!("{} has not been fitted", name))
}
