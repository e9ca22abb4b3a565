//! Quad bagging
//!
//! Expands a manifest of individually labeled locations into synthetic
//! "last four places visited" windows. Each window (a quad) is built around
//! an anchor row, a partner of the same class, and two uniform draws, then
//! shuffled and labeled with the majority class of its members.

use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::location::FEATURE_DIM;
use crate::random::derive_seed;
use crate::{Error, Result};

/// Locations per quad
pub const QUAD_SIZE: usize = 4;

/// Width of a flattened quad
pub const QUAD_DIM: usize = QUAD_SIZE * FEATURE_DIM;

/// Quads generated per manifest row by default
pub const DEFAULT_MULTIPLIER: usize = 5;

/// A manifest row after categorical encoding and class id assignment
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    pub features: [f64; FEATURE_DIM],
    pub class_id: usize,
}

impl EncodedRow {
    pub fn new(features: [f64; FEATURE_DIM], class_id: usize) -> Self {
        Self { features, class_id }
    }
}

/// One synthetic training example
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingQuad {
    /// Member features concatenated in slot order, class column stripped
    pub features: Vec<f64>,
    /// Class ids of the members in the same slot order
    pub member_classes: [usize; QUAD_SIZE],
    /// Majority class of the members
    pub label: usize,
}

/// Sampler settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Quads generated per manifest row
    #[serde(default = "default_multiplier")]
    pub multiplier: usize,
    /// Seed for reproducible sampling; OS entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_multiplier() -> usize {
    DEFAULT_MULTIPLIER
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_MULTIPLIER,
            seed: None,
        }
    }
}

/// Builds `multiplier * n` training quads from an `n` row manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadSampler {
    multiplier: usize,
}

impl Default for QuadSampler {
    fn default() -> Self {
        Self::new(DEFAULT_MULTIPLIER)
    }
}

impl QuadSampler {
    pub fn new(multiplier: usize) -> Self {
        Self { multiplier }
    }

    pub fn from_config(config: &SamplerConfig) -> Self {
        Self::new(config.multiplier)
    }

    #[inline]
    pub fn multiplier(&self) -> usize {
        self.multiplier
    }

    /// Sample all quads sequentially from one generator
    ///
    /// Rounds are the outer loop and anchors the inner loop, so the output
    /// holds `multiplier` consecutive passes over the manifest in row order.
    pub fn sample<R: Rng + ?Sized>(&self, rows: &[EncodedRow], rng: &mut R) -> Result<Vec<TrainingQuad>> {
        self.validate(rows)?;

        let mut quads = Vec::with_capacity(rows.len() * self.multiplier);
        for _ in 0..self.multiplier {
            sample_round(rows, rng, &mut quads);
        }

        debug!(rows = rows.len(), quads = quads.len(), "sampled training quads");
        Ok(quads)
    }

    /// Sample rounds on the rayon pool, one derived generator per round
    ///
    /// The result depends only on `seed`, never on thread scheduling.
    pub fn sample_parallel(&self, rows: &[EncodedRow], seed: u64) -> Result<Vec<TrainingQuad>> {
        self.validate(rows)?;

        let rounds: Vec<Vec<TrainingQuad>> = (0..self.multiplier)
            .into_par_iter()
            .map(|round| {
                let mut rng = StdRng::seed_from_u64(derive_seed(seed, round as u64));
                let mut quads = Vec::with_capacity(rows.len());
                sample_round(rows, &mut rng, &mut quads);
                quads
            })
            .collect();

        let quads = rounds.concat();
        debug!(rows = rows.len(), quads = quads.len(), "sampled training quads in parallel");
        Ok(quads)
    }

    fn validate(&self, rows: &[EncodedRow]) -> Result<()> {
        if rows.is_empty() {
            return Err(Error::ManifestFormat("manifest has no rows".to_string()));
        }
        if self.multiplier == 0 {
            return Err(Error::InvalidConfig("sampler multiplier must be > 0".to_string()));
        }
        Ok(())
    }
}

/// One pass over the manifest, one quad per anchor
fn sample_round<R: Rng + ?Sized>(rows: &[EncodedRow], rng: &mut R, out: &mut Vec<TrainingQuad>) {
    for anchor in rows {
        out.push(build_quad(rows, anchor, rng));
    }
}

fn build_quad<R: Rng + ?Sized>(rows: &[EncodedRow], anchor: &EncodedRow, rng: &mut R) -> TrainingQuad {
    let partner = same_class_partner(rows, anchor.class_id, rng).unwrap_or(anchor);

    let mut members: [&EncodedRow; QUAD_SIZE] = [anchor, partner, anchor, anchor];
    for slot in members.iter_mut().skip(2) {
        *slot = &rows[rng.random_range(0..rows.len())];
    }
    members.shuffle(rng);

    let mut features = Vec::with_capacity(QUAD_DIM);
    let mut member_classes = [0usize; QUAD_SIZE];
    for (slot, member) in members.iter().enumerate() {
        features.extend_from_slice(&member.features);
        member_classes[slot] = member.class_id;
    }

    TrainingQuad {
        features,
        label: majority_label(&member_classes),
        member_classes,
    }
}

/// Last row in the manifest sharing `class_id`, or a uniform draw if none does
///
/// A well-formed manifest always contains the anchor itself, so the fallback
/// only fires for rows built outside the manifest. `None` only for no rows.
pub fn same_class_partner<'a, R: Rng + ?Sized>(
    rows: &'a [EncodedRow],
    class_id: usize,
    rng: &mut R,
) -> Option<&'a EncodedRow> {
    match rows.iter().rev().find(|row| row.class_id == class_id) {
        Some(row) => Some(row),
        None => rows.choose(rng),
    }
}

/// Most frequent class; ties go to the lowest class id
pub fn majority_label(classes: &[usize]) -> usize {
    let mut best_class = usize::MAX;
    let mut best_count = 0usize;
    for &candidate in classes {
        let count = classes.iter().filter(|&&c| c == candidate).count();
        if count > best_count || (count == best_count && candidate < best_class) {
            best_class = candidate;
            best_count = count;
        }
    }
    if best_count == 0 {
        0
    } else {
        best_class
    }
}
