//! Nearest-destination labeling
//!
//! Fabricated training manifests label each sampled location with the class
//! table destination closest to it in encoded feature space.

use crate::location::{Destination, LabeledLocation, LocationFeatures, FEATURE_DIM};
use crate::{Error, Result};

/// Index of the destination nearest to `encoded` (squared Euclidean distance)
///
/// Ties keep the earlier destination.
pub fn nearest_destination(encoded: &[f64; FEATURE_DIM], destinations: &[[f64; FEATURE_DIM]]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, candidate) in destinations.iter().enumerate() {
        let distance: f64 = encoded
            .iter()
            .zip(candidate.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((idx, distance)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Label every land location with its nearest destination
///
/// Locations at elevation zero are treated as open water and dropped.
/// Fails if nothing remains after filtering.
pub fn label_by_nearest(
    locations: &[LocationFeatures],
    destinations: &[Destination],
) -> Result<Vec<LabeledLocation>> {
    if destinations.is_empty() {
        return Err(Error::InvalidInput("class table is empty".to_string()));
    }

    let encoded_destinations = destinations
        .iter()
        .map(|d| d.features.encode())
        .collect::<Result<Vec<_>>>()?;

    let mut labeled = Vec::with_capacity(locations.len());
    for location in locations.iter().filter(|l| l.elevation != 0.0) {
        let encoded = location.encode()?;
        if let Some(idx) = nearest_destination(&encoded, &encoded_destinations) {
            labeled.push(LabeledLocation::new(location.clone(), destinations[idx].label()));
        }
    }

    if labeled.is_empty() {
        return Err(Error::InvalidInput("no land locations to label".to_string()));
    }
    Ok(labeled)
}
