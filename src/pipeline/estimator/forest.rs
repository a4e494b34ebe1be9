//! Bootstrap random forest of absolute-error regression trees

use faer::Mat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::tree::DecisionTreeRegressor;
use super::{check_fit_shape, check_predict_shape, columns_of, not_fitted, Regressor, DEFAULT_ESTIMATOR_SEED};
use crate::error::Result;

/// Forest averaging the predictions of independently bootstrapped trees.
/// Every split considers all features.
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
    trees: Vec<DecisionTreeRegressor>,
}

impl Default for RandomForestRegressor {
    /// 100 trees of depth at most 40, seeded with 420
    fn default() -> Self {
        Self::new(100, Some(40), DEFAULT_ESTIMATOR_SEED)
    }
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize, max_depth: Option<usize>, seed: u64) -> Self {
        Self {
            n_estimators,
            max_depth,
            seed,
            trees: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForestRegressor {
    fn name(&self) -> &'static str {
        "random forest"
    }

    fn fit(&mut self, x: &Mat<f64>, y: &[f64]) -> Result<()> {
        check_fit_shape(x, y)?;
        let n_samples = x.nrows();
        let columns = columns_of(x);

        // Tree seeds depend only on the index, so the thread count does not
        // change the result
        self.trees = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(tree_idx as u64));
                let sample: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();

                let mut tree = DecisionTreeRegressor::new().with_max_depth(self.max_depth);
                tree.fit_indices(&columns, y, &sample)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(())
    }

    fn predict(&self, x: &Mat<f64>) -> Result<Vec<f64>> {
        let first = self.trees.first().ok_or_else(|| not_fitted("random forest"))?;
        check_predict_shape(x, first.n_features())?;

        let n_trees = self.trees.len() as f64;
        (0..x.nrows())
            .map(|row| {
                let mut total = 0.0;
                for tree in &self.trees {
                    total += tree.evaluate(|col| x[(row, col)])?;
                }
                Ok(total / n_trees)
            })
            .collect()
    }
}
