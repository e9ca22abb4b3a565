use serde::{Deserialize, Serialize};
use tourfusion_core::Result;

use crate::boost::{BoostParams, BoostedStumps};
use crate::forest::{ForestParams, RandomForest};
use crate::matrix::FeatureMatrix;

/// A multiclass classifier over dense feature rows
///
/// Implementations are immutable once fitted, so `predict` may run from
/// many threads at once.
pub trait Classifier: Sized + Send + Sync {
    type Params;

    /// Fit on `x` with class ids in `0..n_classes`
    fn fit(x: &FeatureMatrix, labels: &[usize], n_classes: usize, params: &Self::Params) -> Result<Self>;

    /// Predict the class id of one row
    fn predict_row(&self, row: &[f64]) -> usize;

    /// Row width seen at fit time
    fn n_features(&self) -> usize;

    fn n_classes(&self) -> usize;

    /// Predict every row of `x`
    fn predict(&self, x: &FeatureMatrix) -> Vec<usize> {
        x.rows().map(|row| self.predict_row(row)).collect()
    }
}

/// Which ensemble to train, with its hyper-parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierConfig {
    RandomForest(ForestParams),
    BoostedStumps(BoostParams),
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig::RandomForest(ForestParams::default())
    }
}

impl ClassifierConfig {
    /// Short name for logs and artifacts
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierConfig::RandomForest(_) => "random_forest",
            ClassifierConfig::BoostedStumps(_) => "boosted_stumps",
        }
    }

    /// Fit the configured ensemble
    pub fn fit(&self, x: &FeatureMatrix, labels: &[usize], n_classes: usize) -> Result<Ensemble> {
        Ok(match self {
            ClassifierConfig::RandomForest(params) => {
                Ensemble::RandomForest(RandomForest::fit(x, labels, n_classes, params)?)
            }
            ClassifierConfig::BoostedStumps(params) => {
                Ensemble::BoostedStumps(BoostedStumps::fit(x, labels, n_classes, params)?)
            }
        })
    }
}

/// A fitted ensemble of either kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ensemble {
    RandomForest(RandomForest),
    BoostedStumps(BoostedStumps),
}

impl Ensemble {
    pub fn kind(&self) -> &'static str {
        match self {
            Ensemble::RandomForest(_) => "random_forest",
            Ensemble::BoostedStumps(_) => "boosted_stumps",
        }
    }

    pub fn predict_row(&self, row: &[f64]) -> usize {
        match self {
            Ensemble::RandomForest(model) => model.predict_row(row),
            Ensemble::BoostedStumps(model) => model.predict_row(row),
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Ensemble::RandomForest(model) => model.n_features(),
            Ensemble::BoostedStumps(model) => model.n_features(),
        }
    }

    pub fn n_classes(&self) -> usize {
        match self {
            Ensemble::RandomForest(model) => model.n_classes(),
            Ensemble::BoostedStumps(model) => model.n_classes(),
        }
    }
}
