//! hearing-trainer - offline model training
//!
//! `hearing-trainer train` fits the classifier and writes the model artifact.
//! `hearing-trainer generate` writes a synthetic audiogram dataset.
//! Running without a subcommand trains with the configured defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hearing_common::config::HearingConfig;
use hearing_trainer::{synth, Trainer, TrainerOptions};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for hearing-trainer
#[derive(Parser, Debug)]
#[command(name = "hearing-trainer")]
#[command(about = "Train the hearing profile classifier")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "HEARING_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit the classifier, write the artifact and print the evaluation report
    Train(TrainArgs),
    /// Write a synthetic labelled dataset
    Generate(GenerateArgs),
}

#[derive(Args, Debug, Default)]
struct TrainArgs {
    /// Labelled dataset (CSV)
    #[arg(short, long, env = "HEARING_DATASET_PATH")]
    dataset: Option<PathBuf>,

    /// Where to write the model artifact
    #[arg(short, long, env = "HEARING_MODEL_PATH")]
    model_out: Option<PathBuf>,

    /// Number of trees in the forest
    #[arg(long)]
    trees: Option<usize>,

    /// Seed for partitioning and fitting
    #[arg(long)]
    seed: Option<u64>,

    /// Share of rows held out for evaluation
    #[arg(long)]
    test_fraction: Option<f64>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Output CSV path
    #[arg(short, long, default_value = hearing_common::config::DEFAULT_DATASET_PATH)]
    out: PathBuf,

    /// Number of rows
    #[arg(short, long, default_value = "5000")]
    rows: usize,

    #[arg(long, default_value = "42")]
    seed: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = HearingConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting hearing-trainer v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(Command::Generate(args)) => generate(args),
        Some(Command::Train(args)) => train(&config, args),
        None => train(&config, TrainArgs::default()),
    }
}

fn train(config: &HearingConfig, args: TrainArgs) -> Result<()> {
    let mut options = TrainerOptions::from(config);
    if let Some(dataset) = args.dataset {
        options.dataset_path = dataset;
    }
    if let Some(model_out) = args.model_out {
        options.model_path = model_out;
    }
    if let Some(trees) = args.trees {
        options.n_trees = trees;
    }
    if let Some(seed) = args.seed {
        options.seed = seed;
    }
    if let Some(fraction) = args.test_fraction {
        options.test_fraction = fraction;
    }

    info!("Dataset: {}", options.dataset_path.display());
    info!("Model artifact: {}", options.model_path.display());

    let outcome = match Trainer::new(options).run() {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Training aborted: {}", e);
            return Err(e).context("Training run failed");
        }
    };

    println!();
    println!("Model saved at: {}", outcome.model_path.display());
    println!();
    print!("{}", outcome.report);
    Ok(())
}

fn generate(args: GenerateArgs) -> Result<()> {
    let dataset = synth::generate(args.rows, args.seed);
    dataset
        .write_csv(&args.out)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    info!("Wrote {} synthetic samples to {}", dataset.len(), args.out.display());
    Ok(())
}
