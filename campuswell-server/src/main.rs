//! campuswell-server binary — load the exported artifact and serve
//! predictions.

use campuswell_server::AppState;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Campuswell prediction API server
#[derive(Parser, Debug)]
#[command(name = "campuswell-server", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (location of .campuswell/config.toml)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Bind host (overrides configuration)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides configuration)
    #[arg(long)]
    port: Option<u16>,

    /// Artifact path (defaults to the configured model directory)
    #[arg(short, long)]
    model: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let config = campuswell_core::config::load_config(Some(&workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let model_path = cli
        .model
        .unwrap_or_else(|| config.training.artifact_path());

    // A missing artifact is not fatal: the server stays up for /health and
    // /metrics and answers /predict with 503 until a model is trained.
    let pipeline = match campuswell_core::TrainedPipeline::load(&model_path) {
        Ok(pipeline) => Some(pipeline),
        Err(e) => {
            tracing::warn!(
                path = %model_path.display(),
                error = %e,
                "no usable artifact; /predict will return 503 until one is trained"
            );
            None
        }
    };

    let state = Arc::new(AppState::new(pipeline));
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    campuswell_server::run(state, &host, port).await?;
    Ok(())
}
