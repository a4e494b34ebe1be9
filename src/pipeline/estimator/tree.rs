//! CART regression tree with an absolute-error split criterion
//!
//! Leaves predict the median of their rows. A split is the midpoint between
//! two adjacent distinct feature values that minimises the summed absolute
//! deviation from the median in both children.

use faer::Mat;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::{check_fit_shape, check_predict_shape, columns_of, not_fitted, Regressor};
use crate::error::{PrepError, Result};

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn evaluate(&self, value_of: &impl Fn(usize) -> f64) -> f64 {
        match self {
            Node::Leaf { value } => *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if value_of(*feature) <= *threshold {
                    left.evaluate(value_of)
                } else {
                    right.evaluate(value_of)
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecisionTreeRegressor {
    /// `None` grows until leaves are pure or cannot be split
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    root: Option<Node>,
    n_features: usize,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            root: None,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Depth of the fitted tree (a single leaf has depth 0)
    pub fn depth(&self) -> Option<usize> {
        self.root.as_ref().map(Node::depth)
    }

    /// Fit on the rows listed in `indices`, which may repeat (bootstrap)
    pub(crate) fn fit_indices(
        &mut self,
        columns: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
    ) -> Result<()> {
        if indices.is_empty() {
            return Err(PrepError::Configuration(
                "Cannot fit a tree on zero rows".to_string(),
            ));
        }
        self.n_features = columns.len();
        self.root = Some(self.build(columns, y, indices.to_vec(), 0));
        Ok(())
    }

    /// Predict one row, reading feature `j` through `value_of(j)`
    pub(crate) fn evaluate(&self, value_of: impl Fn(usize) -> f64) -> Result<f64> {
        let root = self.root.as_ref().ok_or_else(|| not_fitted("decision tree"))?;
        Ok(root.evaluate(&value_of))
    }

    pub(crate) fn n_features(&self) -> usize {
        self.n_features
    }

    fn build(&self, columns: &[Vec<f64>], y: &[f64], indices: Vec<usize>, depth: usize) -> Node {
        let values: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
        let center = median(&values);
        let leaf = Node::Leaf { value: center };

        if indices.len() < self.min_samples_split || self.max_depth.is_some_and(|d| depth >= d) {
            return leaf;
        }
        let impurity = values.iter().map(|v| (v - center).abs()).sum::<f64>() / values.len() as f64;
        if impurity <= f64::EPSILON {
            return leaf;
        }

        let Some(split) = best_split(columns, y, &indices) else {
            return leaf;
        };

        let feature_values = &columns[split.feature];
        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| feature_values[i] <= split.threshold);
        if left.is_empty() || right.is_empty() {
            return leaf;
        }

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.build(columns, y, left, depth + 1)),
            right: Box::new(self.build(columns, y, right, depth + 1)),
        }
    }
}

impl Regressor for DecisionTreeRegressor {
    fn name(&self) -> &'static str {
        "decision tree"
    }

    fn fit(&mut self, x: &Mat<f64>, y: &[f64]) -> Result<()> {
        check_fit_shape(x, y)?;
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.fit_indices(&columns_of(x), y, &indices)
    }

    fn predict(&self, x: &Mat<f64>) -> Result<Vec<f64>> {
        check_predict_shape(x, self.n_features)?;
        (0..x.nrows())
            .map(|row| self.evaluate(|col| x[(row, col)]))
            .collect()
    }
}

struct Split {
    feature: usize,
    threshold: f64,
    cost: f64,
}

/// Lowest-cost split over all features. Ties keep the earlier feature and
/// the earlier position.
fn best_split(columns: &[Vec<f64>], y: &[f64], indices: &[usize]) -> Option<Split> {
    let mut best: Option<Split> = None;

    for (feature, values) in columns.iter().enumerate() {
        let mut ordered = indices.to_vec();
        ordered.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

        let prefix = running_costs(ordered.iter().map(|&i| y[i]));
        let mut suffix = running_costs(ordered.iter().rev().map(|&i| y[i]));
        suffix.reverse();

        for pos in 1..ordered.len() {
            let lo = values[ordered[pos - 1]];
            let hi = values[ordered[pos]];
            // NaN sorts last and compares false; a threshold next to it
            // would send every row the same way
            if !lo.is_finite() || !hi.is_finite() || lo >= hi {
                continue;
            }
            let cost = prefix[pos] + suffix[pos];
            if best.as_ref().map_or(true, |b| cost < b.cost) {
                let mut threshold = lo + (hi - lo) / 2.0;
                // adjacent floats can round the midpoint up to `hi`
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(Split {
                    feature,
                    threshold,
                    cost,
                });
            }
        }
    }

    best
}

/// `out[k]` is the absolute deviation from the median of the first `k` values
fn running_costs(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut tracker = MedianTracker::default();
    let mut out = vec![0.0];
    for value in values {
        tracker.push(value);
        out.push(tracker.cost());
    }
    out
}

/// Median of a non-empty slice; the mean of the two middle values when even
pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OrdF64(f64);

impl Eq for OrdF64 {}

impl PartialOrd for OrdF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Two-heap running median with the summed absolute deviation from it.
/// `lower` holds the smaller half and is never shorter than `upper`.
#[derive(Default)]
struct MedianTracker {
    lower: BinaryHeap<OrdF64>,
    upper: BinaryHeap<Reverse<OrdF64>>,
    lower_sum: f64,
    upper_sum: f64,
}

impl MedianTracker {
    fn push(&mut self, value: f64) {
        match self.lower.peek() {
            Some(top) if value > top.0 => {
                self.upper.push(Reverse(OrdF64(value)));
                self.upper_sum += value;
            }
            _ => {
                self.lower.push(OrdF64(value));
                self.lower_sum += value;
            }
        }

        if self.lower.len() > self.upper.len() + 1 {
            if let Some(OrdF64(moved)) = self.lower.pop() {
                self.lower_sum -= moved;
                self.upper.push(Reverse(OrdF64(moved)));
                self.upper_sum += moved;
            }
        } else if self.upper.len() > self.lower.len() {
            if let Some(Reverse(OrdF64(moved))) = self.upper.pop() {
                self.upper_sum -= moved;
                self.lower.push(OrdF64(moved));
                self.lower_sum += moved;
            }
        }
    }

    /// Any point between the two middle values minimises the deviation, so
    /// the top of `lower` serves as the median here
    fn cost(&self) -> f64 {
        let Some(&OrdF64(m)) = self.lower.peek() else {
            return 0.0;
        };
        let below = m * self.lower.len() as f64 - self.lower_sum;
        let above = self.upper_sum - m * self.upper.len() as f64;
        (below + above).max(0.0)
    }
}
