// Integration tests for TourFusion
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tourfusion::{
    random_source, read_manifest, write_manifest, ClassTable, ClassifierConfig, ClassifierModel,
    Error, ForestParams, LabeledLocation, LocationFeatures, QuadSampler, RecommendConfig,
    RecommendationEngine, SharedModel, TourfusionConfig, CLIMATE_ZONE, QUAD_DIM, TREWARTHA,
};
use tourfusion_core::label_by_nearest;

const CLASSES_CSV: &str = "\
Rank,City,Country,Latitude,Longitude,Elevation,AverageTemperature,Trewartha,ClimateZone
1,Bangkok,Thailand,13.75,100.5,2,28.6,Aw,Tropical Wet-And-Dry
2,Paris,France,48.86,2.35,35,12.3,Do,Temperate Oceanic
3,Cairo,Egypt,30.04,31.24,23,22.1,BW,Desert or Arid
4,Reykjavik,Iceland,64.15,-21.94,15,4.6,Eo,\"Boreal, Maritime Subarctic\"
5,Quito,Ecuador,-0.18,-78.47,2850,13.9,Ar,Tropical Wet
";

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Four jittered copies of every class table destination
fn manifest_csv() -> String {
    let table = ClassTable::from_reader(CLASSES_CSV.as_bytes(), "classes").unwrap();
    let mut csv = String::from("Latitude,Longitude,Elevation,AverageTemperature,Trewartha,ClimateZone,Class\n");
    for step in 0..4 {
        for d in table.destinations() {
            let f = &d.features;
            let jitter = step as f64 * 0.25;
            csv.push_str(&format!(
                "{},{},{},{},{},\"{}\",\"{}\"\n",
                f.latitude + jitter,
                f.longitude - jitter,
                f.elevation + jitter,
                f.average_temperature,
                f.trewartha,
                f.climate_zone,
                d.label()
            ));
        }
    }
    csv
}

fn forest(seed: u64) -> ClassifierConfig {
    ClassifierConfig::RandomForest(ForestParams {
        n_trees: 30,
        seed: Some(seed),
        ..ForestParams::default()
    })
}

fn train(manifest: &[LabeledLocation], config: ClassifierConfig) -> ClassifierModel {
    let mut model = ClassifierModel::new(config);
    let mut rng = random_source(Some(42));
    let (inputs, labels) = model.prepare(manifest, &QuadSampler::default(), &mut rng).unwrap();
    model.train(&inputs, &labels).unwrap();
    model
}

fn history(classes: &ClassTable) -> Vec<LocationFeatures> {
    classes
        .destinations()
        .iter()
        .map(|d| d.features.clone())
        .collect()
}

#[test]
fn test_train_save_load_recommend() {
    let dir = TempDir::new().unwrap();
    let manifest_path = write(dir.path(), "master.csv", &manifest_csv());
    let classes_path = write(dir.path(), "classes.csv", CLASSES_CSV);
    let model_path = dir.path().join("bin").join("dest_suggestor.bin");

    let manifest = read_manifest(&manifest_path).unwrap();
    assert_eq!(manifest.len(), 20);
    let model = train(&manifest, forest(1));
    model.save(&model_path).unwrap();

    let restored = ClassifierModel::open(&model_path).unwrap();
    let classes = ClassTable::load(&classes_path).unwrap();
    let config = RecommendConfig {
        num_recommendations: 8,
        seed: Some(9),
        ..RecommendConfig::default()
    };

    let original = RecommendationEngine::new(&model, &classes, config)
        .recommend_seeded(&history(&classes))
        .unwrap();
    let reloaded = RecommendationEngine::new(&restored, &classes, config)
        .recommend_seeded(&history(&classes))
        .unwrap();

    assert!(!original.is_empty());
    assert!(original.len() <= 5);
    assert_eq!(original, reloaded);
    for recommendation in &original {
        assert!(classes.get(&recommendation.label).is_some());
    }
}

#[test]
fn test_quad_count_and_labels() {
    let manifest = read_manifest_from_str(&manifest_csv());
    let mut model = ClassifierModel::default();
    let mut rng = random_source(Some(3));

    let (inputs, labels) = model.prepare(&manifest, &QuadSampler::new(3), &mut rng).unwrap();
    assert_eq!(inputs.len(), 60);
    assert!(inputs.iter().all(|row| row.len() == QUAD_DIM));
    assert!(labels.iter().all(|&label| label < 5));
}

#[test]
fn test_two_row_manifest() {
    let table = ClassTable::from_reader(CLASSES_CSV.as_bytes(), "classes").unwrap();
    let manifest: Vec<LabeledLocation> = table.destinations()[..2]
        .iter()
        .map(|d| LabeledLocation::new(d.features.clone(), d.label()))
        .collect();

    let mut model = ClassifierModel::default();
    let mut rng = random_source(Some(17));
    let (inputs, labels) = model.prepare(&manifest, &QuadSampler::new(1), &mut rng).unwrap();

    assert_eq!(inputs.len(), 2);
    assert!(labels.iter().all(|&label| label <= 1));
}

#[test]
fn test_single_location_history() {
    let classes = ClassTable::from_reader(CLASSES_CSV.as_bytes(), "classes").unwrap();
    let model = train(&read_manifest_from_str(&manifest_csv()), forest(2));
    let engine = RecommendationEngine::new(
        &model,
        &classes,
        RecommendConfig {
            num_recommendations: 1,
            ..RecommendConfig::default()
        },
    );
    let mut rng = random_source(Some(5));

    let results = engine.recommend(&history(&classes)[..1], &mut rng).unwrap();
    assert!(results.len() <= 1);
}

#[test]
fn test_untrained_and_out_of_range_errors() {
    let untrained = ClassifierModel::default();
    assert!(matches!(
        untrained.predict(&[vec![0.0; QUAD_DIM]]),
        Err(Error::ModelNotTrained)
    ));

    let model = train(&read_manifest_from_str(&manifest_csv()), forest(4));
    assert!(matches!(
        model.decode_label(99),
        Err(Error::IndexOutOfRange { index: 99, len: 5 })
    ));
}

#[test]
fn test_vocabulary_roundtrip() {
    let codes = TREWARTHA.encode(&["BW", "Ar", "Fi"]).unwrap();
    assert_eq!(codes, vec![13, 0, 12]);
    assert_eq!(TREWARTHA.decode(&codes).unwrap(), vec!["BW", "Ar", "Fi"]);

    assert!(matches!(
        CLIMATE_ZONE.encode(&["Savanna"]),
        Err(Error::UnknownCategory { .. })
    ));
}

#[test]
fn test_corrupt_artifact_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.bin");
    let model = train(&read_manifest_from_str(&manifest_csv()), forest(5));
    model.save(&path).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0x55;
    fs::write(&path, bytes).unwrap();

    assert!(matches!(ClassifierModel::open(&path), Err(Error::Persistence(_))));
}

#[test]
fn test_boosted_stumps_from_config() {
    let config = TourfusionConfig::from_json(
        r#"{ "classifier": { "kind": "boosted_stumps", "n_estimators": 30 } }"#,
    )
    .unwrap();
    let model = train(&read_manifest_from_str(&manifest_csv()), config.classifier);
    assert_eq!(config.classifier.kind(), "boosted_stumps");
    assert!(model.is_trained());

    let classes = ClassTable::from_reader(CLASSES_CSV.as_bytes(), "classes").unwrap();
    let engine = RecommendationEngine::new(&model, &classes, config.recommend);
    let mut rng = random_source(Some(6));
    let results = engine.recommend(&history(&classes), &mut rng).unwrap();
    assert!(!results.is_empty());
}

#[test]
fn test_shared_model_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.bin");
    let model = train(&read_manifest_from_str(&manifest_csv()), forest(7));
    model.save(&path).unwrap();

    let shared = SharedModel::default();
    shared.reload(&path).unwrap();

    let classes = ClassTable::from_reader(CLASSES_CSV.as_bytes(), "classes").unwrap();
    let guard = shared.read();
    let engine = RecommendationEngine::new(&guard, &classes, RecommendConfig::default());
    let mut rng = random_source(Some(8));
    assert!(engine.recommend(&history(&classes), &mut rng).is_ok());
}

#[test]
fn test_fabricated_manifest_roundtrip() {
    let dir = TempDir::new().unwrap();
    let classes = ClassTable::from_reader(CLASSES_CSV.as_bytes(), "classes").unwrap();

    let mut locations = history(&classes);
    for location in &mut locations {
        location.latitude += 0.5;
    }
    // Open water is dropped
    let mut ocean = locations[0].clone();
    ocean.elevation = 0.0;
    locations.push(ocean);

    let manifest = label_by_nearest(&locations, classes.destinations()).unwrap();
    assert_eq!(manifest.len(), 5);
    assert_eq!(manifest[1].class, "Paris, France");

    let path = dir.path().join("generated").join("master.csv");
    write_manifest(&path, &manifest).unwrap();
    assert_eq!(read_manifest(&path).unwrap(), manifest);
}

fn read_manifest_from_str(csv: &str) -> Vec<LabeledLocation> {
    tourfusion_storage::read_manifest_from(csv.as_bytes(), "inline").unwrap()
}
