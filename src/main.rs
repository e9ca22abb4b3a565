use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tourfusion::dataset::{create_random_user, enrich_classes, fabricate_dataset};
use tourfusion::{
    random_source, read_manifest, write_manifest, ClassTable, ClassifierConfig, ClassifierModel,
    Geocoder, GraphClient, QuadSampler, RecommendationEngine, TourfusionConfig,
};
use tourfusion_storage::read_city_list;

const NO_USER_ERROR: &str = "No user_id provided to utilize for inference.";

/// Next-destination suggestions from a traveler's location history
#[derive(Parser, Debug)]
#[command(name = "tourfusion")]
#[command(about = "Suggests where a traveler goes next", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level, used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Location graph GraphQL endpoint
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train or load the model, then recommend destinations for a user
    Suggest(SuggestArgs),
    /// Build a training manifest from random land locations
    Fabricate(FabricateArgs),
    /// Geocode a ranked city list and fill in its climate features
    EnrichClasses(EnrichArgs),
}

#[derive(Args, Debug)]
struct SuggestArgs {
    /// Train on the manifest and save the model instead of loading it
    #[arg(long)]
    train: bool,

    /// Training manifest CSV
    #[arg(long, default_value = "./data/generated/master.csv")]
    manifest: PathBuf,

    /// Model artifact to write after training or read otherwise
    #[arg(long, default_value = "./bin/dest_suggestor.bin")]
    model: PathBuf,

    /// Destination class table CSV
    #[arg(long, default_value = "./data/classes.csv")]
    classes: PathBuf,

    /// User whose history drives the recommendations
    #[arg(long)]
    user_id: Option<String>,

    /// Prediction rounds, and the most results returned
    #[arg(long)]
    num_recommendations: Option<usize>,

    /// Seed for sampling, training and recommendation
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct FabricateArgs {
    /// Destination class table CSV
    #[arg(long, default_value = "./data/classes.csv")]
    classes: PathBuf,

    /// Manifest CSV to write
    #[arg(long, default_value = "./data/generated/master.csv")]
    manifest: PathBuf,

    /// Random locations to generate before ocean points are dropped
    #[arg(long, default_value_t = 500)]
    size: usize,

    /// Existing user to attach locations to; a new one is created otherwise
    #[arg(long)]
    user_id: Option<String>,

    /// Enrich the class table from its Rank, City, Country columns first
    #[arg(long)]
    set_class_data: bool,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct EnrichArgs {
    /// City list with Rank, City, Country columns
    #[arg(long, default_value = "./data/classes.csv")]
    classes: PathBuf,

    /// Where to write the class table; overwrites the input when omitted
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    user_id: Option<String>,

    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting TourFusion v{}", env!("CARGO_PKG_VERSION"));

    let mut config = TourfusionConfig::load_or_default(cli.config.as_deref())?;
    if let Some(endpoint) = cli.endpoint {
        config.graph.endpoint = endpoint;
    }

    match cli.command {
        Command::Suggest(args) => {
            let output = suggest(args, config).await?;
            println!("{}", serde_json::to_string(&output)?);
        }
        Command::Fabricate(args) => fabricate(args, config).await?,
        Command::EnrichClasses(args) => enrich(args, config).await?,
    }
    Ok(())
}

async fn suggest(args: SuggestArgs, mut config: TourfusionConfig) -> Result<Value> {
    if let Some(seed) = args.seed {
        apply_seed(&mut config, seed);
    }
    if let Some(n) = args.num_recommendations {
        config.recommend.num_recommendations = n;
    }

    let model = if args.train {
        train(&args, &config)?
    } else {
        ClassifierModel::open(&args.model)
            .with_context(|| format!("failed to load model {}", args.model.display()))?
    };

    let Some(user_id) = args.user_id else {
        return Ok(json!({ "Error": NO_USER_ERROR }));
    };

    let classes = ClassTable::load(&args.classes)?;
    let graph = GraphClient::new(config.graph.clone())?;
    let history = graph.history(&user_id).await?;
    info!(user_id = %user_id, history = history.len(), "performing inference");

    let engine = RecommendationEngine::new(&model, &classes, config.recommend);
    let recommendations = engine.recommend_seeded(&history)?;
    Ok(json!({ "Prediction": recommendations }))
}

fn train(args: &SuggestArgs, config: &TourfusionConfig) -> Result<ClassifierModel> {
    info!(manifest = %args.manifest.display(), kind = config.classifier.kind(), "beginning training");
    let manifest = read_manifest(&args.manifest)?;
    let sampler = QuadSampler::from_config(&config.sampler);

    let mut model = ClassifierModel::new(config.classifier);
    let (inputs, labels) = match config.sampler.seed {
        Some(seed) => model.prepare_parallel(&manifest, &sampler, seed)?,
        None => model.prepare(&manifest, &sampler, &mut random_source(None))?,
    };
    model.train(&inputs, &labels)?;
    model.save(&args.model)?;
    Ok(model)
}

/// One seed for every random stage that has none of its own
fn apply_seed(config: &mut TourfusionConfig, seed: u64) {
    config.sampler.seed.get_or_insert(seed);
    config.recommend.seed.get_or_insert(seed);
    if let ClassifierConfig::RandomForest(params) = &mut config.classifier {
        params.seed.get_or_insert(seed);
    }
}

async fn fabricate(args: FabricateArgs, config: TourfusionConfig) -> Result<()> {
    let graph = GraphClient::new(config.graph.clone())?;
    let mut rng = random_source(args.seed);

    let user_id = match args.user_id {
        Some(user_id) => user_id,
        None => create_random_user(&graph, &mut rng).await?,
    };

    if args.set_class_data {
        let geocoder = Geocoder::new(config.geocoder.clone())?;
        let cities = read_city_list(&args.classes)?;
        enrich_classes(&graph, &geocoder, &user_id, &cities)
            .await?
            .write(&args.classes)?;
    }

    let classes = ClassTable::load(&args.classes)?;
    let manifest = fabricate_dataset(&graph, &classes, &user_id, args.size, &mut rng).await?;
    write_manifest(&args.manifest, &manifest)?;
    info!(manifest = %args.manifest.display(), rows = manifest.len(), "dataset fabricated");
    Ok(())
}

async fn enrich(args: EnrichArgs, config: TourfusionConfig) -> Result<()> {
    let graph = GraphClient::new(config.graph.clone())?;
    let geocoder = Geocoder::new(config.geocoder.clone())?;
    let mut rng = random_source(args.seed);

    let user_id = match args.user_id {
        Some(user_id) => user_id,
        None => create_random_user(&graph, &mut rng).await?,
    };

    let cities = read_city_list(&args.classes)?;
    let table = enrich_classes(&graph, &geocoder, &user_id, &cities).await?;
    let output = args.output.unwrap_or(args.classes);
    table.write(&output)?;
    info!(output = %output.display(), destinations = table.len(), "class table written");
    Ok(())
}
