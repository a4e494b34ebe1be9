//! AdaBoost.R2 with linear loss over unconstrained absolute-error trees

use faer::Mat;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::tree::DecisionTreeRegressor;
use super::{check_fit_shape, check_predict_shape, columns_of, not_fitted, Regressor, DEFAULT_ESTIMATOR_SEED};
use crate::error::{PrepError, Result};

#[derive(Debug, Clone)]
pub struct AdaBoostRegressor {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub seed: u64,
    estimators: Vec<DecisionTreeRegressor>,
    estimator_weights: Vec<f64>,
}

impl Default for AdaBoostRegressor {
    /// 100 rounds at learning rate 0.1, seeded with 420
    fn default() -> Self {
        Self::new(100, 0.1, DEFAULT_ESTIMATOR_SEED)
    }
}

impl AdaBoostRegressor {
    pub fn new(n_estimators: usize, learning_rate: f64, seed: u64) -> Self {
        Self {
            n_estimators,
            learning_rate,
            seed,
            estimators: Vec::new(),
            estimator_weights: Vec::new(),
        }
    }

    /// Weights of the kept estimators, in boosting order
    pub fn estimator_weights(&self) -> &[f64] {
        &self.estimator_weights
    }
}

impl Regressor for AdaBoostRegressor {
    fn name(&self) -> &'static str {
        "adaboost"
    }

    /// Each round fits a tree on a bootstrap drawn with the current sample
    /// weights. Boosting stops on a perfect fit or once the weighted error
    /// reaches 0.5; a round that fails that way is discarded unless it is
    /// the only one.
    fn fit(&mut self, x: &Mat<f64>, y: &[f64]) -> Result<()> {
        check_fit_shape(x, y)?;
        let n_samples = x.nrows();
        let columns = columns_of(x);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut sample_weight = vec![1.0 / n_samples as f64; n_samples];

        self.estimators.clear();
        self.estimator_weights.clear();

        for round in 0..self.n_estimators {
            let dist = WeightedIndex::new(&sample_weight).map_err(|e| {
                PrepError::Configuration(format!("Invalid boosting sample weights: {}", e))
            })?;
            let sample: Vec<usize> = (0..n_samples).map(|_| dist.sample(&mut rng)).collect();

            let mut tree = DecisionTreeRegressor::new();
            tree.fit_indices(&columns, y, &sample)?;

            let mut errors = Vec::with_capacity(n_samples);
            for (row, target) in y.iter().enumerate() {
                let predicted = tree.evaluate(|col| columns[col][row])?;
                errors.push((predicted - target).abs());
            }

            let error_max = errors
                .iter()
                .zip(&sample_weight)
                .filter(|(_, &w)| w > 0.0)
                .map(|(&e, _)| e)
                .fold(0.0f64, f64::max);
            if error_max > 0.0 {
                errors.iter_mut().for_each(|e| *e /= error_max);
            }

            let estimator_error: f64 = errors
                .iter()
                .zip(&sample_weight)
                .filter(|(_, &w)| w > 0.0)
                .map(|(&e, &w)| e * w)
                .sum();

            if estimator_error <= 0.0 {
                self.estimators.push(tree);
                self.estimator_weights.push(1.0);
                break;
            }
            if estimator_error >= 0.5 {
                if self.estimators.is_empty() {
                    self.estimators.push(tree);
                    self.estimator_weights.push(0.0);
                }
                break;
            }

            let beta = estimator_error / (1.0 - estimator_error);
            self.estimators.push(tree);
            self.estimator_weights.push(self.learning_rate * (1.0 / beta).ln());

            if round + 1 == self.n_estimators {
                break;
            }
            for (w, e) in sample_weight.iter_mut().zip(&errors) {
                if *w > 0.0 {
                    *w *= beta.powf((1.0 - e) * self.learning_rate);
                }
            }
            let total: f64 = sample_weight.iter().sum();
            if total <= 0.0 {
                break;
            }
            sample_weight.iter_mut().for_each(|w| *w /= total);
        }

        Ok(())
    }

    /// Weighted median of the estimators' predictions
    fn predict(&self, x: &Mat<f64>) -> Result<Vec<f64>> {
        let first = self.estimators.first().ok_or_else(|| not_fitted("adaboost"))?;
        check_predict_shape(x, first.n_features())?;

        (0..x.nrows())
            .map(|row| {
                let predictions = self
                    .estimators
                    .iter()
                    .map(|tree| tree.evaluate(|col| x[(row, col)]))
                    .collect::<Result<Vec<f64>>>()?;
                Ok(weighted_median(&predictions, &self.estimator_weights))
            })
            .collect()
    }
}

/// First prediction, in ascending order, whose cumulative weight reaches
/// half the total. All-zero weights count every prediction equally.
fn weighted_median(predictions: &[f64], weights: &[f64]) -> f64 {
    let mut order: Vec<usize> = (0..predictions.len()).collect();
    order.sort_by(|&a, &b| predictions[a].total_cmp(&predictions[b]));

    let total: f64 = weights.iter().sum();
    let uniform = total <= 0.0;
    let total = if uniform { predictions.len() as f64 } else { total };

    let mut cumulative = 0.0;
    for &idx in &order {
        cumulative += if uniform { 1.0 } else { weights[idx] };
        if cumulative >= 0.5 * total {
            return predictions[idx];
        }
    }
    order.last().map_or(0.0, |&idx| predictions[idx])
}
