//! Agri price CLI
//!
//! Trains the commodity price models from a CSV export, scores single rows
//! and prints stored training reports.

use agri_price_core::{InferenceAdapter, QueryRow, TrainingReport, UnseenCategoryPolicy};
use agri_price_registry::ModelRegistry;
use agri_price_trainer::{dataset, pipeline, PipelineConfig, VERSION};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "agri-price")]
#[command(author = "Agri Price Contributors")]
#[command(version = VERSION)]
#[command(about = "Agricultural commodity price prediction", long_about = None)]
struct Cli {
    /// Pipeline configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean a CSV export, train both models and save the artifacts
    Train(TrainArgs),
    /// Estimate the modal price of one market row
    Predict(PredictArgs),
    /// Print the metrics and feature ranking of the stored models
    Report(ReportArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Input CSV dataset path
    #[arg(short, long)]
    input: PathBuf,

    /// Artifact directory (overrides registry.model_dir)
    #[arg(short, long)]
    models: Option<PathBuf>,

    /// Random seed for the split and the forest (overrides training.seed)
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct PredictArgs {
    /// Artifact directory (overrides registry.model_dir)
    #[arg(short, long)]
    models: Option<PathBuf>,

    #[arg(long)]
    state: String,
    #[arg(long)]
    district: String,
    #[arg(long)]
    market: String,
    #[arg(long)]
    commodity: String,
    #[arg(long)]
    variety: String,
    #[arg(long)]
    grade: String,

    /// Arrival date, dd-mm-yyyy or yyyy-mm-dd
    #[arg(long)]
    date: String,

    #[arg(long)]
    min_price: f64,
    #[arg(long)]
    max_price: f64,

    /// Train from this CSV first if the artifacts are missing
    #[arg(long)]
    train_from: Option<PathBuf>,

    /// Map unseen categorical values to the most frequent training value
    #[arg(long)]
    allow_unseen: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Artifact directory (overrides registry.model_dir)
    #[arg(short, long)]
    models: Option<PathBuf>,

    /// Number of features to list
    #[arg(long, default_value = "13")]
    top: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Command::Train(args) => train(config, args),
        Command::Predict(args) => predict(config, args),
        Command::Report(args) => report(config, args),
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn train(mut config: PipelineConfig, args: TrainArgs) -> Result<()> {
    if let Some(models) = args.models {
        config.registry.model_dir = models;
    }
    if let Some(seed) = args.seed {
        config.training.seed = seed;
    }

    info!("Agri price trainer v{VERSION}");
    info!("Loading dataset from: {}", args.input.display());
    let raw = dataset::load_csv(&args.input).context("Failed to load dataset")?;
    info!("Loaded {} rows", raw.len());

    let registry = ModelRegistry::open(&config.registry.model_dir);
    let run = pipeline::train_and_save(&raw, &[], &config, &registry).context("Training failed")?;

    info!(
        "Cleaning: {} -> {} rows ({} bad dates, outliers {:?}, imputed {:?})",
        run.cleaning.input_rows,
        run.cleaning.output_rows,
        run.cleaning.dropped_bad_date,
        run.cleaning.outliers,
        run.cleaning.imputed
    );
    print_report(&run.artifacts().report, 5);
    info!("✓ Artifacts saved to {}", config.registry.model_dir.display());
    Ok(())
}

fn predict(mut config: PipelineConfig, args: PredictArgs) -> Result<()> {
    if let Some(models) = args.models {
        config.registry.model_dir = models;
    }
    let policy = if args.allow_unseen {
        UnseenCategoryPolicy::Fallback
    } else {
        config.inference.unseen_category
    };

    let query = QueryRow {
        state: args.state,
        district: args.district,
        market: args.market,
        commodity: args.commodity,
        variety: args.variety,
        grade: args.grade,
        arrival_date: args.date,
        min_price: args.min_price,
        max_price: args.max_price,
    };

    let registry = ModelRegistry::open(&config.registry.model_dir);
    let artifacts = pipeline::load_or_train(
        &registry,
        &config,
        args.train_from.as_deref(),
        std::slice::from_ref(&query),
    )
    .context("Failed to obtain model artifacts")?;

    let adapter = InferenceAdapter::new(artifacts, policy).context("Invalid model artifacts")?;
    let (prediction, report) = adapter
        .predict_with_report(&query)
        .context("Prediction failed")?;

    if args.json {
        let out = serde_json::json!({
            "prediction": prediction,
            "metrics": { "bagging": report.bagging, "boosted": report.boosted },
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Random forest estimate: {:.2}", prediction.bagging);
    println!("XGBoost estimate:       {:.2}", prediction.boosted);
    println!();
    print_metrics(report);
    Ok(())
}

fn report(mut config: PipelineConfig, args: ReportArgs) -> Result<()> {
    if let Some(models) = args.models {
        config.registry.model_dir = models;
    }
    let registry = ModelRegistry::open(&config.registry.model_dir);
    let artifacts = registry
        .load_artifacts()
        .with_context(|| format!("No usable models in {}", config.registry.model_dir.display()))?;
    println!(
        "Artifacts in {}: {}",
        config.registry.model_dir.display(),
        registry.list()?.join(", ")
    );
    print_report(&artifacts.report, args.top);
    Ok(())
}

fn print_metrics(report: &TrainingReport) {
    println!(
        "Trained on {} rows, evaluated on {} held-out rows (seed {})",
        report.train_rows, report.test_rows, report.seed
    );
    println!("{:<16} {:>12} {:>12} {:>8}", "model", "RMSE", "MAE", "R2");
    for (name, m) in [("random_forest", &report.bagging), ("xgboost", &report.boosted)] {
        println!("{name:<16} {:>12.2} {:>12.2} {:>8.4}", m.rmse, m.mae, m.r2);
    }
}

fn print_report(report: &TrainingReport, top: usize) {
    print_metrics(report);
    println!();
    println!("{:<20} {:>10} {:>10}", "feature", "forest", "boosted");
    for item in report.top_features(top) {
        println!(
            "{:<20} {:>10.4} {:>10.4}",
            item.feature, item.bagging, item.boosted
        );
    }
}
