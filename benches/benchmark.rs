// Performance benchmarks for quad sampling, training and recommendation
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use tourfusion::{
    random_source, ClassTable, ClassifierConfig, ClassifierModel, Destination, EncodedRow,
    ForestParams, LabeledLocation, LocationFeatures, QuadSampler, RecommendConfig,
    RecommendationEngine,
};

const TREWARTHA: &[&str] = &["Ar", "Aw", "Cf", "Do", "Eo", "BW"];
const ZONES: &[&str] = &[
    "Tropical Wet",
    "Tropical Wet-And-Dry",
    "Subtropical Humid",
    "Temperate Oceanic",
    "Boreal, Maritime Subarctic",
    "Desert or Arid",
];

fn random_location(rng: &mut StdRng) -> LocationFeatures {
    LocationFeatures {
        latitude: rng.random_range(-90.0..90.0),
        longitude: rng.random_range(-180.0..180.0),
        elevation: rng.random_range(1.0..3000.0),
        average_temperature: rng.random_range(-10.0..30.0),
        trewartha: TREWARTHA[rng.random_range(0..TREWARTHA.len())].to_string(),
        climate_zone: ZONES[rng.random_range(0..ZONES.len())].to_string(),
    }
}

fn class_table(n_classes: usize, rng: &mut StdRng) -> ClassTable {
    ClassTable::new(
        (0..n_classes)
            .map(|idx| Destination {
                rank: idx as u32 + 1,
                city: format!("City{}", idx),
                country: "Country".to_string(),
                features: random_location(rng),
            })
            .collect(),
    )
}

fn manifest(classes: &ClassTable, rows: usize, rng: &mut StdRng) -> Vec<LabeledLocation> {
    (0..rows)
        .map(|idx| {
            let destination = &classes.destinations()[idx % classes.len()];
            LabeledLocation::new(random_location(rng), destination.label())
        })
        .collect()
}

fn forest(n_trees: usize) -> ClassifierConfig {
    ClassifierConfig::RandomForest(ForestParams {
        n_trees,
        seed: Some(7),
        ..ForestParams::default()
    })
}

fn benchmark_quad_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("quad_sampling");
    let mut rng = random_source(Some(1));

    for size in [100, 1000, 10000].iter() {
        let rows: Vec<EncodedRow> = (0..*size)
            .map(|idx| {
                let encoded = [
                    rng.random_range(-90.0..90.0),
                    rng.random_range(-180.0..180.0),
                    rng.random_range(0.0..3000.0),
                    rng.random_range(-10.0..30.0),
                    rng.random_range(0..15) as f64,
                    rng.random_range(0..13) as f64,
                ];
                EncodedRow::new(encoded, idx % 20)
            })
            .collect();
        let sampler = QuadSampler::default();

        group.bench_with_input(BenchmarkId::new("sequential", size), &rows, |b, rows| {
            let mut rng = random_source(Some(2));
            b.iter(|| black_box(sampler.sample(rows, &mut rng).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("parallel", size), &rows, |b, rows| {
            b.iter(|| black_box(sampler.sample_parallel(rows, 3).unwrap()));
        });
    }
    group.finish();
}

fn benchmark_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10);
    let mut rng = random_source(Some(4));
    let classes = class_table(20, &mut rng);

    for rows in [200, 1000].iter() {
        let manifest = manifest(&classes, *rows, &mut rng);
        let mut model = ClassifierModel::new(forest(50));
        let (inputs, labels) = model
            .prepare(&manifest, &QuadSampler::default(), &mut rng)
            .unwrap();

        group.bench_with_input(BenchmarkId::new("forest_50", rows), rows, |b, _| {
            b.iter(|| {
                let mut candidate = model.clone();
                candidate.train(&inputs, &labels).unwrap();
                black_box(candidate)
            });
        });
    }
    group.finish();
}

fn benchmark_recommend(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommend");
    let mut rng = random_source(Some(5));
    let classes = class_table(20, &mut rng);
    let manifest = manifest(&classes, 500, &mut rng);

    let mut model = ClassifierModel::new(forest(100));
    let (inputs, labels) = model
        .prepare(&manifest, &QuadSampler::default(), &mut rng)
        .unwrap();
    model.train(&inputs, &labels).unwrap();

    for history_len in [1, 10, 100].iter() {
        let history: Vec<LocationFeatures> = (0..*history_len).map(|_| random_location(&mut rng)).collect();
        let engine = RecommendationEngine::new(&model, &classes, RecommendConfig::default());

        group.bench_with_input(BenchmarkId::new("history", history_len), &history, |b, history| {
            let mut rng = random_source(Some(6));
            b.iter(|| black_box(engine.recommend(history, &mut rng).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_quad_sampling, benchmark_training, benchmark_recommend);
criterion_main!(benches);
