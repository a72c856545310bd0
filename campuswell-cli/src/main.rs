//! campuswell CLI — train the depression risk classifier, validate the
//! dataset, and score records against the exported artifact.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Campuswell: student depression risk classification pipeline
#[derive(Parser, Debug)]
#[command(name = "campuswell", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (location of .campuswell/config.toml)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the full training pipeline and export the artifact
    Train {
        /// Number of randomized search trials
        #[arg(long)]
        trials: Option<usize>,

        /// Number of stratified cross-validation folds
        #[arg(long)]
        folds: Option<usize>,

        /// Master random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Held-out fraction of the dataset
        #[arg(long)]
        test_size: Option<f64>,

        /// Directory the artifact and metrics are exported to
        #[arg(long)]
        model_dir: Option<PathBuf>,

        /// Skip experiment tracking for this run
        #[arg(long)]
        no_tracking: bool,
    },
    /// Predict depression risk for one student record
    Predict {
        /// JSON file with the student's feature fields
        input: PathBuf,

        /// Artifact path (defaults to the configured model directory)
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
    /// Dataset operations
    Data {
        #[command(subcommand)]
        action: DataAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum DataAction {
    /// Resolve the dataset and validate it against the declared schema
    Validate,
    /// Import the flat CSV file into the relational store
    Load,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Human-readable layer for stderr (always active)
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer for structured logging
    let log_dir = directories::ProjectDirs::from("dev", "campuswell", "campuswell")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "campuswell.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    // Resolve workspace
    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    match cli.command {
        Commands::Train {
            trials,
            folds,
            seed,
            test_size,
            model_dir,
            no_tracking,
        } => {
            commands::train(
                &workspace,
                commands::TrainArgs {
                    trials,
                    folds,
                    seed,
                    test_size,
                    model_dir,
                    no_tracking,
                },
            )
            .await
        }
        Commands::Predict { input, model } => commands::predict(&workspace, &input, model).await,
        Commands::Data { action } => match action {
            DataAction::Validate => commands::validate_data(&workspace).await,
            DataAction::Load => commands::load_data(&workspace).await,
        },
    }
}
