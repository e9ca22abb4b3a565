//! # TourFusion Model
//!
//! Ensemble classifiers and the destination classifier built on them.
//!
//! - [`RandomForest`] and [`BoostedStumps`] behind the [`Classifier`] trait
//! - [`ClassifierConfig`] selects and parameterises one of them
//! - [`ClassifierModel`] prepares quads, trains, predicts and persists
//! - [`SharedModel`] serves concurrent predictions while allowing reloads

pub mod artifact;
pub mod boost;
pub mod classifier;
pub mod forest;
pub mod labels;
pub mod matrix;
pub mod shared;
pub mod suggestor;
pub mod tree;

pub use artifact::{ModelArtifact, FORMAT_VERSION, MAGIC};
pub use boost::{BoostParams, BoostedStumps};
pub use classifier::{Classifier, ClassifierConfig, Ensemble};
pub use forest::{ForestParams, RandomForest};
pub use labels::LabelTable;
pub use matrix::FeatureMatrix;
pub use shared::SharedModel;
pub use suggestor::{ClassifierModel, TrainingSet};
pub use tree::{DecisionTree, TreeParams};
