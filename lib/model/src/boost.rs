//! Boosted decision stumps (multiclass AdaBoost, SAMME)
//!
//! Each round fits a shallow tree on the current sample weights, scores it
//! by weighted error, and up-weights the rows it got wrong. Prediction is
//! the class with the largest summed learner weight.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tourfusion_core::{Error, Result};
use tracing::debug;

use crate::classifier::Classifier;
use crate::forest::validate_labels;
use crate::matrix::FeatureMatrix;
use crate::tree::{argmax, DecisionTree, TreeParams};

/// Hyper-parameters for [`BoostedStumps`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostParams {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Depth of each weak learner; 1 is a stump
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_n_estimators() -> usize {
    100
}

fn default_learning_rate() -> f64 {
    1.0
}

fn default_max_depth() -> usize {
    1
}

impl Default for BoostParams {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            learning_rate: default_learning_rate(),
            max_depth: default_max_depth(),
        }
    }
}

/// Weighted ensemble of shallow trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedStumps {
    learners: Vec<(f64, DecisionTree)>,
    n_classes: usize,
    n_features: usize,
}

impl BoostedStumps {
    pub fn n_learners(&self) -> usize {
        self.learners.len()
    }
}

impl Classifier for BoostedStumps {
    type Params = BoostParams;

    fn fit(x: &FeatureMatrix, labels: &[usize], n_classes: usize, params: &BoostParams) -> Result<Self> {
        if params.n_estimators == 0 {
            return Err(Error::InvalidConfig("n_estimators must be > 0".to_string()));
        }
        if !(params.learning_rate.is_finite() && params.learning_rate > 0.0) {
            return Err(Error::InvalidConfig("learning_rate must be finite and > 0".to_string()));
        }
        validate_labels(x, labels, n_classes)?;

        let n_rows = x.n_rows();
        let indices: Vec<usize> = (0..n_rows).collect();
        let tree_params = TreeParams {
            max_depth: Some(params.max_depth.max(1)),
            min_samples_split: 2,
            max_features: None,
        };
        // Stumps consider every feature, the generator is never drawn from
        let mut rng = StdRng::seed_from_u64(0);

        let mut weights = vec![1.0 / n_rows as f64; n_rows];
        let mut learners = Vec::with_capacity(params.n_estimators);
        let chance_error = 1.0 - 1.0 / n_classes as f64;

        for round in 0..params.n_estimators {
            let tree = DecisionTree::fit_weighted(x, labels, &weights, &indices, n_classes, &tree_params, &mut rng);
            let missed: Vec<bool> = (0..n_rows).map(|i| tree.predict(x.row(i)) != labels[i]).collect();

            let total: f64 = weights.iter().sum();
            let error: f64 = weights
                .iter()
                .zip(&missed)
                .filter(|(_, &m)| m)
                .map(|(w, _)| w)
                .sum::<f64>()
                / total;

            if error <= 0.0 || n_classes == 1 {
                // A perfect learner decides alone
                learners.push((1.0, tree));
                break;
            }
            if error >= chance_error {
                // No better than chance; keep the first learner so the model is usable
                if learners.is_empty() {
                    learners.push((1.0, tree));
                }
                debug!(round, error, "boosting stopped at chance-level error");
                break;
            }

            let alpha = params.learning_rate * (((1.0 - error) / error).ln() + ((n_classes - 1) as f64).ln());
            for (w, &m) in weights.iter_mut().zip(&missed) {
                if m {
                    *w *= alpha.exp();
                }
            }
            let total: f64 = weights.iter().sum();
            weights.iter_mut().for_each(|w| *w /= total);
            learners.push((alpha, tree));
        }

        debug!(learners = learners.len(), rows = n_rows, n_classes, "fitted boosted stumps");
        Ok(Self {
            learners,
            n_classes,
            n_features: x.n_features(),
        })
    }

    fn predict_row(&self, row: &[f64]) -> usize {
        let mut scores = vec![0.0; self.n_classes.max(1)];
        for (alpha, tree) in &self.learners {
            let class = tree.predict(row);
            if class < scores.len() {
                scores[class] += alpha;
            }
        }
        argmax(&scores)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }
}
