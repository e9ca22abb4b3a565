//! # TourFusion Core
//!
//! Core library for the TourFusion destination suggestor.
//!
//! This crate provides the data model and the training-example synthesis:
//!
//! - [`LocationFeatures`] - Geographic and climate features of one place
//! - [`Vocabulary`] - Fixed climate vocabularies ([`TREWARTHA`], [`CLIMATE_ZONE`])
//! - [`QuadSampler`] - Quad bagging: 4-location training windows with majority labels
//! - [`RandomSource`] - Explicit, seedable random generator
//!
//! ## Example
//!
//! ```rust
//! use tourfusion_core::{EncodedRow, QuadSampler, random_source, QUAD_DIM};
//!
//! let rows = vec![
//!     EncodedRow::new([0.0, 0.0, 0.0, 0.0, 2.0, 1.0], 0),
//!     EncodedRow::new([10.0, 10.0, 10.0, 10.0, 13.0, 11.0], 1),
//! ];
//! let mut rng = random_source(Some(7));
//! let quads = QuadSampler::new(1).sample(&rows, &mut rng).unwrap();
//! assert_eq!(quads.len(), 2);
//! assert_eq!(quads[0].features.len(), QUAD_DIM);
//! ```

pub mod codec;
pub mod error;
pub mod location;
pub mod nearest;
pub mod quad;
pub mod random;

pub use codec::{Vocabulary, CLIMATE_ZONE, TREWARTHA};
pub use error::{Error, Result};
pub use location::{flatten_encoded, Destination, LabeledLocation, LocationFeatures, FEATURE_DIM};
pub use nearest::label_by_nearest;
pub use quad::{
    majority_label, EncodedRow, QuadSampler, SamplerConfig, TrainingQuad, DEFAULT_MULTIPLIER,
    QUAD_DIM, QUAD_SIZE,
};
pub use random::{derive_seed, random_source, RandomSource};
