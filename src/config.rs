//! Run configuration
//!
//! Every section is optional in the JSON file and falls back to its defaults:
//!
//! ```json
//! {
//!   "classifier": { "kind": "random_forest", "n_trees": 200 },
//!   "sampler": { "multiplier": 5 },
//!   "recommend": { "num_recommendations": 4, "pad_from_classes": true },
//!   "graph": { "endpoint": "http://localhost:5000/api", "max_retries": 3 }
//! }
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tourfusion_api::{GeocoderConfig, GraphConfig};
use tourfusion_core::SamplerConfig;
use tourfusion_model::ClassifierConfig;
use tourfusion_recommend::RecommendConfig;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TourfusionConfig {
    pub classifier: ClassifierConfig,
    pub sampler: SamplerConfig,
    pub recommend: RecommendConfig,
    pub graph: GraphConfig,
    pub geocoder: GeocoderConfig,
}

impl TourfusionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults when `path` is absent
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sampler.multiplier == 0 {
            bail!("sampler.multiplier must be > 0");
        }
        if self.graph.endpoint.trim().is_empty() {
            bail!("graph.endpoint must not be empty");
        }
        match self.classifier {
            ClassifierConfig::RandomForest(params) if params.n_trees == 0 => {
                bail!("classifier.n_trees must be > 0")
            }
            ClassifierConfig::BoostedStumps(params) if params.n_estimators == 0 => {
                bail!("classifier.n_estimators must be > 0")
            }
            _ => Ok(()),
        }
    }
}
