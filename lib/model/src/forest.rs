//! Random forest classifier
//!
//! A bagged ensemble of [`DecisionTree`]s: each tree sees a bootstrap sample
//! of the training rows and a random subset of features at every split.
//! Trees are grown in parallel, each from its own seed derived from the
//! forest seed, so a seeded forest is identical across runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tourfusion_core::{derive_seed, Error, Result};
use tracing::debug;

use crate::classifier::Classifier;
use crate::matrix::FeatureMatrix;
use crate::tree::{argmax, DecisionTree, TreeParams};

/// Hyper-parameters for [`RandomForest`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    /// Features per split; `sqrt(n_features)` when `None`
    #[serde(default)]
    pub max_features: Option<usize>,
    /// Draw a bootstrap sample per tree; all rows otherwise
    #[serde(default = "default_bootstrap")]
    pub bootstrap: bool,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_n_trees() -> usize {
    200
}

fn default_min_samples_split() -> usize {
    2
}

fn default_bootstrap() -> bool {
    true
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            max_features: None,
            bootstrap: true,
            seed: None,
        }
    }
}

/// A random forest (majority vote over decision trees)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
    n_features: usize,
}

impl RandomForest {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    type Params = ForestParams;

    fn fit(x: &FeatureMatrix, labels: &[usize], n_classes: usize, params: &ForestParams) -> Result<Self> {
        if params.n_trees == 0 {
            return Err(Error::InvalidConfig("n_trees must be > 0".to_string()));
        }
        validate_labels(x, labels, n_classes)?;

        let n_rows = x.n_rows();
        let n_features = x.n_features();
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            max_features: Some(
                params
                    .max_features
                    .unwrap_or_else(|| (n_features as f64).sqrt() as usize)
                    .clamp(1, n_features),
            ),
        };
        let base_seed = params.seed.unwrap_or_else(rand::random);
        let weights = vec![1.0; n_rows];

        let trees: Vec<DecisionTree> = (0..params.n_trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(derive_seed(base_seed, t as u64));
                let indices: Vec<usize> = if params.bootstrap {
                    (0..n_rows).map(|_| rng.random_range(0..n_rows)).collect()
                } else {
                    (0..n_rows).collect()
                };
                DecisionTree::fit_weighted(x, labels, &weights, &indices, n_classes, &tree_params, &mut rng)
            })
            .collect();

        debug!(trees = trees.len(), rows = n_rows, n_classes, "fitted random forest");
        Ok(Self {
            trees,
            n_classes,
            n_features,
        })
    }

    fn predict_row(&self, row: &[f64]) -> usize {
        let mut votes = vec![0.0; self.n_classes.max(1)];
        for tree in &self.trees {
            let class = tree.predict(row);
            if class < votes.len() {
                votes[class] += 1.0;
            }
        }
        argmax(&votes)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }
}

/// Shared label checks for ensemble fitting
pub(crate) fn validate_labels(x: &FeatureMatrix, labels: &[usize], n_classes: usize) -> Result<()> {
    if labels.len() != x.n_rows() {
        return Err(Error::InvalidInput(format!(
            "labels length {} != rows {}",
            labels.len(),
            x.n_rows()
        )));
    }
    if n_classes == 0 {
        return Err(Error::InvalidInput("n_classes must be > 0".to_string()));
    }
    if let Some(&bad) = labels.iter().find(|&&l| l >= n_classes) {
        return Err(Error::IndexOutOfRange {
            index: bad,
            len: n_classes,
        });
    }
    Ok(())
}
