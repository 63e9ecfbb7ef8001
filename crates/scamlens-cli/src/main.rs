//! ScamLens CLI
//!
//! Batch entry point: reads a comment table, runs the feature pipeline and
//! writes the feature table.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use scamlens_features::{ModelSourceSpec, Orchestrator, PipelineConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "scamlens")]
#[command(about = "Feature extraction for Vietnamese comment scam detection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Turn raw comments into a feature table
    Preprocess(PreprocessArgs),
}

#[derive(Args, Debug)]
struct PreprocessArgs {
    /// Input comments (CSV, or JSON array when the extension is .json)
    #[arg(short, long, default_value = "data/demo_comments.csv")]
    input: PathBuf,

    /// Output feature table
    #[arg(short, long, default_value = "data/features_initial.csv")]
    output: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = "scamlens.yaml")]
    config: PathBuf,

    /// Records processed concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Local encoder directory instead of downloading from the hub
    #[arg(long, env = "SCAMLENS_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Word segmentation lexicon file
    #[arg(long)]
    lexicon: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json_logs);

    match cli.command {
        Command::Preprocess(args) => preprocess(args).await,
    }
}

async fn preprocess(args: PreprocessArgs) -> Result<()> {
    let config = load_config(&args)?;
    info!("Configuration loaded successfully");
    info!("Target language: {}", config.target_language);
    info!("Workers: {}", config.workers);

    // Loading the encoder blocks for a while, keep it off the runtime threads.
    let orchestrator = tokio::task::spawn_blocking(move || build_orchestrator(&config))
        .await
        .context("Encoder loading task failed")??;
    info!("Pipeline ready: {:?}", orchestrator);

    let summary = orchestrator
        .run_file(&args.input, &args.output)
        .await
        .with_context(|| format!("Failed to process {}", args.input.display()))?;

    println!("{:<20} {}", "Input rows:", summary.total);
    println!("{:<20} {}", "Filtered (language):", summary.filtered);
    println!("{:<20} {}", "Failed:", summary.failed);
    println!("{:<20} {}", "Written:", summary.written);
    println!("{:<20} {}", "Output:", args.output.display());

    Ok(())
}

/// Load the config file, or defaults, then apply CLI overrides
fn load_config(args: &PreprocessArgs) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    if let Some(model_dir) = &args.model_dir {
        config.encoder.source = ModelSourceSpec::Local {
            path: model_dir.clone(),
        };
    }

    if let Some(lexicon) = &args.lexicon {
        config.segmenter.lexicon = Some(lexicon.clone());
    }

    config.validate()?;
    Ok(config)
}

#[cfg(feature = "ml-models")]
fn build_orchestrator(config: &PipelineConfig) -> Result<Orchestrator> {
    Ok(Orchestrator::from_config(config)?)
}

#[cfg(not(feature = "ml-models"))]
fn build_orchestrator(_config: &PipelineConfig) -> Result<Orchestrator> {
    anyhow::bail!("scamlens was built without the ml-models feature; no encoder is available")
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("scamlens=debug,scamlens_features=debug,scamlens_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("scamlens=info,scamlens_features=info,scamlens_core=info")
        })
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
