//! Weighted-sampling recommendation
//!
//! A user's history is usually too short or too long to be a single model
//! input. The engine treats it as a pool, draws quads from it with a bias
//! toward recent entries, and collects the distinct destinations the model
//! predicts for them.

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tourfusion_core::{
    flatten_encoded, random_source, Destination, Error, LocationFeatures, Result, QUAD_SIZE,
};
use tourfusion_model::ClassifierModel;
use tourfusion_storage::ClassTable;
use tracing::{debug, info};

pub const DEFAULT_NUM_RECOMMENDATIONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendConfig {
    /// Prediction rounds; also the upper bound on results
    #[serde(default = "default_num_recommendations")]
    pub num_recommendations: usize,
    /// Pad a short history with one class table destination
    #[serde(default = "default_pad_from_classes")]
    pub pad_from_classes: bool,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_num_recommendations() -> usize {
    DEFAULT_NUM_RECOMMENDATIONS
}

fn default_pad_from_classes() -> bool {
    true
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            num_recommendations: DEFAULT_NUM_RECOMMENDATIONS,
            pad_from_classes: true,
            seed: None,
        }
    }
}

/// A suggested destination with its class table attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "Class")]
    pub label: String,
    #[serde(flatten)]
    pub destination: Destination,
}

pub struct RecommendationEngine<'a> {
    model: &'a ClassifierModel,
    classes: &'a ClassTable,
    config: RecommendConfig,
}

impl<'a> RecommendationEngine<'a> {
    pub fn new(model: &'a ClassifierModel, classes: &'a ClassTable, config: RecommendConfig) -> Self {
        Self {
            model,
            classes,
            config,
        }
    }

    pub fn config(&self) -> &RecommendConfig {
        &self.config
    }

    /// Recommend using a generator seeded from the config
    pub fn recommend_seeded(&self, history: &[LocationFeatures]) -> Result<Vec<Recommendation>> {
        let mut rng = random_source(self.config.seed);
        self.recommend(history, &mut rng)
    }

    /// Up to `num_recommendations` distinct destinations for `history`
    ///
    /// `history` is ordered oldest to newest. Results keep the order in
    /// which destinations were first predicted.
    pub fn recommend<R: Rng + ?Sized>(
        &self,
        history: &[LocationFeatures],
        rng: &mut R,
    ) -> Result<Vec<Recommendation>> {
        if !self.model.is_trained() {
            return Err(Error::ModelNotTrained);
        }

        let pool = self.candidate_pool(history, rng)?;
        let draw = WeightedIndex::new(positional_weights(pool.len()))
            .map_err(|e| Error::InvalidInput(format!("pool weights: {}", e)))?;

        let mut results: Vec<Recommendation> = Vec::with_capacity(self.config.num_recommendations);
        for round in 0..self.config.num_recommendations {
            let window: Vec<&LocationFeatures> = (0..QUAD_SIZE).map(|_| pool[draw.sample(rng)]).collect();
            let id = self.model.predict_one(&flatten_encoded(&window)?)?;
            let label = self.model.decode_label(id)?;

            if results.iter().any(|r| r.label == label) {
                debug!(round, label, "repeat prediction skipped");
                continue;
            }
            let destination = self.classes.lookup(label)?.clone();
            debug!(round, label, "new recommendation");
            results.push(Recommendation {
                label: label.to_string(),
                destination,
            });
        }

        info!(
            history = history.len(),
            pool = pool.len(),
            recommendations = results.len(),
            "recommendation complete"
        );
        Ok(results)
    }

    /// The user's history, padded at the front when shorter than a quad
    fn candidate_pool<'h, R: Rng + ?Sized>(
        &'h self,
        history: &'h [LocationFeatures],
        rng: &mut R,
    ) -> Result<Vec<&'h LocationFeatures>> {
        let mut pool: Vec<&LocationFeatures> = history.iter().collect();

        if pool.len() < QUAD_SIZE && self.config.pad_from_classes && !self.classes.is_empty() {
            let destinations = self.classes.destinations();
            let pick = WeightedIndex::new(positional_weights(destinations.len()))
                .map_err(|e| Error::InvalidInput(format!("class table weights: {}", e)))?
                .sample(rng);
            debug!(padded_with = %destinations[pick].label(), "padded short history");
            pool.insert(0, &destinations[pick].features);
        }

        if pool.is_empty() {
            return Err(Error::NoHistory);
        }
        Ok(pool)
    }
}

/// Weight `i + 1` for position `i`: later entries are drawn more often
pub fn positional_weights(len: usize) -> Vec<u64> {
    (1..=len as u64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourfusion_core::{LabeledLocation, QuadSampler};
    use tourfusion_model::{ClassifierConfig, ForestParams};

    const CITIES: [(&str, &str, f64, &str, &str); 5] = [
        ("Bangkok", "Thailand", 13.7, "Aw", "Tropical Wet-And-Dry"),
        ("Paris", "France", 48.8, "Do", "Temperate Oceanic"),
        ("Cairo", "Egypt", 30.0, "BW", "Desert or Arid"),
        ("Reykjavik", "Iceland", 64.1, "Eo", "Boreal, Maritime Subarctic"),
        ("Lima", "Peru", -12.0, "BW", "Desert or Arid"),
    ];

    fn features(latitude: f64, trewartha: &str, zone: &str) -> LocationFeatures {
        LocationFeatures {
            latitude,
            longitude: latitude * 1.5,
            elevation: 50.0 + latitude.abs(),
            average_temperature: 28.0 - latitude.abs() / 3.0,
            trewartha: trewartha.to_string(),
            climate_zone: zone.to_string(),
        }
    }

    fn class_table() -> ClassTable {
        ClassTable::new(
            CITIES
                .iter()
                .enumerate()
                .map(|(i, (city, country, lat, trewartha, zone))| Destination {
                    rank: i as u32 + 1,
                    city: city.to_string(),
                    country: country.to_string(),
                    features: features(*lat, trewartha, zone),
                })
                .collect(),
        )
    }

    fn train(manifest: &[LabeledLocation]) -> ClassifierModel {
        let mut model = ClassifierModel::new(ClassifierConfig::RandomForest(ForestParams {
            n_trees: 20,
            seed: Some(3),
            ..ForestParams::default()
        }));
        let mut rng = random_source(Some(8));
        let (inputs, labels) = model.prepare(manifest, &QuadSampler::new(4), &mut rng).unwrap();
        model.train(&inputs, &labels).unwrap();
        model
    }

    fn trained_model() -> ClassifierModel {
        let mut manifest = Vec::new();
        for step in 0..4 {
            for (city, country, lat, trewartha, zone) in CITIES {
                manifest.push(LabeledLocation::new(
                    features(lat + step as f64 * 0.2, trewartha, zone),
                    format!("{}, {}", city, country),
                ));
            }
        }
        train(&manifest)
    }

    fn history() -> Vec<LocationFeatures> {
        CITIES
            .iter()
            .map(|(_, _, lat, trewartha, zone)| features(*lat + 0.1, trewartha, zone))
            .collect()
    }

    fn config(num_recommendations: usize) -> RecommendConfig {
        RecommendConfig {
            num_recommendations,
            ..RecommendConfig::default()
        }
    }

    #[test]
    fn test_no_duplicate_labels() {
        let model = trained_model();
        let classes = class_table();
        let engine = RecommendationEngine::new(&model, &classes, config(12));
        let mut rng = random_source(Some(1));

        let results = engine.recommend(&history(), &mut rng).unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= CITIES.len());
        for (i, a) in results.iter().enumerate() {
            assert_eq!(a.label, a.destination.label());
            assert!(results[i + 1..].iter().all(|b| b.label != a.label));
        }
    }

    #[test]
    fn test_single_entry_history_is_padded() {
        let model = trained_model();
        let classes = class_table();
        let engine = RecommendationEngine::new(&model, &classes, config(1));
        let mut rng = random_source(Some(2));

        let full = history();
        let recent = &full[..1];
        let pool = engine.candidate_pool(recent, &mut rng).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool[1], &recent[0]);
        assert!(classes.destinations().iter().any(|d| &d.features == pool[0]));

        let results = engine.recommend(recent, &mut rng).unwrap();
        assert_eq!(results.len(), 1);
        assert!(classes.get(&results[0].label).is_some());
    }

    #[test]
    fn test_padding_only_for_short_history() {
        let model = trained_model();
        let classes = class_table();
        let mut rng = random_source(Some(2));
        let full = history();

        let engine = RecommendationEngine::new(&model, &classes, config(1));
        let pool = engine.candidate_pool(&full, &mut rng).unwrap();
        assert_eq!(pool.len(), full.len());

        let no_padding = RecommendConfig {
            pad_from_classes: false,
            ..config(1)
        };
        let engine = RecommendationEngine::new(&model, &classes, no_padding);
        let pool = engine.candidate_pool(&full[..1], &mut rng).unwrap();
        assert_eq!(pool, vec![&full[0]]);
    }

    #[test]
    fn test_empty_history_uses_padding() {
        let model = trained_model();
        let classes = class_table();
        let engine = RecommendationEngine::new(&model, &classes, config(3));
        let mut rng = random_source(Some(3));

        let results = engine.recommend(&[], &mut rng).unwrap();
        // A pool of one entry always yields the same window
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_no_history_without_fallback() {
        let model = trained_model();
        let classes = class_table();
        let mut rng = random_source(Some(4));

        let no_padding = RecommendConfig {
            pad_from_classes: false,
            ..RecommendConfig::default()
        };
        let engine = RecommendationEngine::new(&model, &classes, no_padding);
        assert!(matches!(engine.recommend(&[], &mut rng), Err(Error::NoHistory)));

        let empty = ClassTable::default();
        let engine = RecommendationEngine::new(&model, &empty, RecommendConfig::default());
        assert!(matches!(engine.recommend(&[], &mut rng), Err(Error::NoHistory)));
    }

    #[test]
    fn test_untrained_model_checked_first() {
        let model = ClassifierModel::default();
        let classes = class_table();
        let engine = RecommendationEngine::new(&model, &classes, RecommendConfig::default());
        let mut rng = random_source(Some(5));
        assert!(matches!(engine.recommend(&[], &mut rng), Err(Error::ModelNotTrained)));
    }

    #[test]
    fn test_label_missing_from_class_table() {
        let manifest = vec![LabeledLocation::new(features(10.0, "Ar", "Tropical Wet"), "Atlantis, Ocean")];
        let model = train(&manifest);
        let classes = class_table();
        let engine = RecommendationEngine::new(&model, &classes, config(1));
        let mut rng = random_source(Some(6));

        assert!(matches!(
            engine.recommend(&history(), &mut rng),
            Err(Error::UnknownDestination(label)) if label == "Atlantis, Ocean"
        ));
    }

    #[test]
    fn test_seeded_runs_agree() {
        let model = trained_model();
        let classes = class_table();
        let engine = RecommendationEngine::new(
            &model,
            &classes,
            RecommendConfig {
                seed: Some(77),
                ..config(6)
            },
        );
        assert_eq!(
            engine.recommend_seeded(&history()).unwrap(),
            engine.recommend_seeded(&history()).unwrap()
        );
    }

    #[test]
    fn test_zero_rounds() {
        let model = trained_model();
        let classes = class_table();
        let engine = RecommendationEngine::new(&model, &classes, config(0));
        let mut rng = random_source(Some(7));
        assert!(engine.recommend(&history(), &mut rng).unwrap().is_empty());
    }

    #[test]
    fn test_positional_weights() {
        assert_eq!(positional_weights(4), vec![1, 2, 3, 4]);
        assert!(positional_weights(0).is_empty());
    }

    #[test]
    fn test_recommendation_json_shape() {
        let classes = class_table();
        let destination = classes.destinations()[1].clone();
        let recommendation = Recommendation {
            label: destination.label(),
            destination,
        };
        let json = serde_json::to_value(&recommendation).unwrap();
        assert_eq!(json["Class"], "Paris, France");
        assert_eq!(json["City"], "Paris");
        assert_eq!(json["Rank"], 2);
        assert_eq!(json["Trewartha"], "Do");
    }
}
