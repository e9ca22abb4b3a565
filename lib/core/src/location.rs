use serde::{Deserialize, Serialize};
use crate::codec::{CLIMATE_ZONE, TREWARTHA};
use crate::Result;

/// Number of encoded features per location
pub const FEATURE_DIM: usize = 6;

/// Geographic and climate description of a single place
///
/// Field order is the encoding order and must stay identical between
/// training and inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocationFeatures {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub average_temperature: f64,
    pub trewartha: String,
    pub climate_zone: String,
}

impl LocationFeatures {
    /// Encode into the fixed numeric layout used by the classifier
    pub fn encode(&self) -> Result<[f64; FEATURE_DIM]> {
        Ok([
            self.latitude,
            self.longitude,
            self.elevation,
            self.average_temperature,
            TREWARTHA.encode_one(&self.trewartha)? as f64,
            CLIMATE_ZONE.encode_one(&self.climate_zone)? as f64,
        ])
    }

    /// Rebuild features from their encoded form
    pub fn decode(encoded: &[f64; FEATURE_DIM]) -> Result<Self> {
        Ok(Self {
            latitude: encoded[0],
            longitude: encoded[1],
            elevation: encoded[2],
            average_temperature: encoded[3],
            trewartha: TREWARTHA.decode_one(encoded[4] as usize)?.to_string(),
            climate_zone: CLIMATE_ZONE.decode_one(encoded[5] as usize)?.to_string(),
        })
    }
}

/// Encode several locations and concatenate them in order
pub fn flatten_encoded(locations: &[&LocationFeatures]) -> Result<Vec<f64>> {
    let mut flat = Vec::with_capacity(locations.len() * FEATURE_DIM);
    for location in locations {
        flat.extend_from_slice(&location.encode()?);
    }
    Ok(flat)
}

/// A manifest row: location features plus the destination class it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledLocation {
    pub features: LocationFeatures,
    pub class: String,
}

impl LabeledLocation {
    pub fn new(features: LocationFeatures, class: impl Into<String>) -> Self {
        Self {
            features,
            class: class.into(),
        }
    }
}

/// A row of the class table: a recognised destination and its attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Destination {
    pub rank: u32,
    pub city: String,
    pub country: String,
    #[serde(flatten)]
    pub features: LocationFeatures,
}

impl Destination {
    /// Class label used by manifests and the model, `"City, Country"`
    pub fn label(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }
}
