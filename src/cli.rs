use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{AppConfig, DEFAULT_MODEL_PATH};
use crate::error::{IrisError, Result};
use crate::logging::init_logging;
use crate::ml::{fit, Dataset, TrainConfig, TrainReport};
use crate::model::ModelHandle;
use crate::server::start_api_server;

#[derive(Parser)]
#[command(name = "iris-predict")]
#[command(version)]
#[command(about = "Serve iris flower predictions over HTTP", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding default.toml and per-environment overrides
    #[arg(long, default_value = "config", env = "IRIS_CONFIG_DIR", global = true)]
    pub config_dir: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP prediction server (default)
    Serve(ServeArgs),
    /// Fit a classifier and write the model artifact
    Train(TrainArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Interface to bind (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,
    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Model artifact path (overrides model.path)
    #[arg(short, long)]
    pub model: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV with four measurements and a label per row (bundled iris data if omitted)
    #[arg(short, long)]
    pub data: Option<PathBuf>,
    /// Where to write the artifact
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    pub output: PathBuf,
    /// Gradient descent epochs
    #[arg(long, default_value = "500")]
    pub epochs: usize,
    /// Gradient descent step size
    #[arg(long, default_value = "0.5")]
    pub learning_rate: f64,
    /// L2 penalty on the weights
    #[arg(long, default_value = "0.0001")]
    pub l2: f64,
    /// Share of rows held out for evaluation
    #[arg(long, default_value = "0.2")]
    pub test_fraction: f64,
    /// Shuffle seed for the train/test split
    #[arg(long, default_value = "42")]
    pub seed: u64,
}

impl TrainArgs {
    pub fn train_config(&self) -> TrainConfig {
        TrainConfig {
            epochs: self.epochs,
            learning_rate: self.learning_rate,
            l2: self.l2,
            test_fraction: self.test_fraction,
            seed: self.seed,
        }
    }
}

/// Load config, apply CLI overrides and validate.
pub fn resolve_config(config_dir: &Path, args: &ServeArgs) -> Result<AppConfig> {
    let mut config = AppConfig::load_from(config_dir)?;
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(model) = &args.model {
        config.model.path = model.clone();
    }

    config
        .validate()
        .map_err(|errors| IrisError::InvalidConfig(errors.join("; ")))?;
    Ok(config)
}

pub async fn run_serve(config_dir: &Path, args: &ServeArgs) -> Result<()> {
    let config = resolve_config(config_dir, args)?;
    init_logging(&config.logging);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        model_path = %config.model.path.display(),
        "starting iris-predict"
    );

    let model = ModelHandle::load(&config.model);
    if !model.is_available() {
        warn!("model unavailable; /health and /predict will answer 500 until restart");
    }

    start_api_server(&config.server, model).await
}

pub fn run_train(args: &TrainArgs) -> Result<TrainReport> {
    let dataset = match &args.data {
        Some(path) => Dataset::from_path(path)?,
        None => Dataset::iris()?,
    };
    info!(rows = dataset.len(), "dataset loaded");

    let (network, report) = fit(&dataset, &args.train_config())?;
    network.save(&args.output)?;
    info!(path = %args.output.display(), "model artifact written");

    Ok(report)
}

pub fn print_train_report(report: &TrainReport, output: &Path) {
    println!("Model written to {}", output.display());
    println!(
        "  train: {} rows, accuracy {:.3}",
        report.train_samples, report.train_accuracy
    );
    match report.test_accuracy {
        Some(acc) => println!("  test:  {} rows, accuracy {:.3}", report.test_samples, acc),
        None => println!("  test:  no rows held out"),
    }
    println!("  final loss {:.4}", report.final_loss);
}
