//! # TourFusion Recommend
//!
//! Turns a user's location history into ranked destination suggestions by
//! repeatedly sampling weighted quads from it and querying a trained
//! [`ClassifierModel`](tourfusion_model::ClassifierModel).

pub mod engine;

pub use engine::{
    positional_weights, Recommendation, RecommendConfig, RecommendationEngine,
    DEFAULT_NUM_RECOMMENDATIONS,
};
