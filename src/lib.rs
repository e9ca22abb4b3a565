//! # TourFusion
//!
//! Next-destination suggestions from a traveler's location history.
//!
//! A classifier is trained on synthetic "quads": windows of four visited
//! places labeled with the destination most of them belong to. At serving
//! time the user's history is sampled into quads, and the distinct
//! predicted destinations become the recommendations.
//!
//! ## Quick Start
//!
//! ```bash
//! # Train on a manifest and recommend for a user
//! tourfusion suggest --train --manifest data/generated/master.csv --user-id 655ac183d1028e5e0b01c52b
//!
//! # Build a manifest from random land locations
//! tourfusion fabricate --classes data/classes.csv --manifest data/generated/master.csv
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use tourfusion::prelude::*;
//! use std::path::Path;
//!
//! let manifest = read_manifest(Path::new("data/generated/master.csv"))?;
//! let classes = ClassTable::load(Path::new("data/classes.csv"))?;
//!
//! let mut rng = random_source(Some(7));
//! let mut model = ClassifierModel::default();
//! let (inputs, labels) = model.prepare(&manifest, &QuadSampler::default(), &mut rng)?;
//! model.train(&inputs, &labels)?;
//!
//! let history: Vec<LocationFeatures> = manifest.iter().take(3).map(|row| row.features.clone()).collect();
//! let engine = RecommendationEngine::new(&model, &classes, RecommendConfig::default());
//! for suggestion in engine.recommend(&history, &mut rng)? {
//!     println!("{}", suggestion.label);
//! }
//! # Ok::<(), tourfusion::Error>(())
//! ```
//!
//! ## Crate Structure
//!
//! - `tourfusion-core` - Location features, climate vocabularies, quad sampling
//! - `tourfusion-model` - Random forest, boosted stumps, model artifacts
//! - `tourfusion-storage` - Manifest and class table CSV files
//! - `tourfusion-recommend` - Weighted-sampling recommendation engine
//! - `tourfusion-api` - Location graph GraphQL client and geocoding

pub mod config;
pub mod dataset;

pub use config::TourfusionConfig;

// Re-export core types
pub use tourfusion_core::{
    random_source, Destination, EncodedRow, Error, LabeledLocation, LocationFeatures, QuadSampler,
    RandomSource, Result, SamplerConfig, TrainingQuad, Vocabulary, CLIMATE_ZONE, QUAD_DIM, TREWARTHA,
};

// Re-export model
pub use tourfusion_model::{
    BoostParams, ClassifierConfig, ClassifierModel, ForestParams, LabelTable, ModelArtifact, SharedModel,
};

// Re-export storage
pub use tourfusion_storage::{read_manifest, write_manifest, ClassTable};

// Re-export recommendation
pub use tourfusion_recommend::{Recommendation, RecommendConfig, RecommendationEngine};

// Re-export network adapters
pub use tourfusion_api::{Geocoder, GeocoderConfig, GraphClient, GraphConfig};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        random_source, read_manifest, ClassTable, ClassifierConfig, ClassifierModel, Destination, Error,
        LabeledLocation, LocationFeatures, QuadSampler, Recommendation, RecommendConfig,
        RecommendationEngine, Result, SharedModel, TourfusionConfig,
    };
}
