mod banner;
mod migrate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use smarthome_api::ApiServer;
use smarthome_config::{AppConfig, ConfigLoader, LogConfig, LogFormat};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::migrate::MigrateArgs;

#[derive(Parser)]
#[command(
    name = "smarthome",
    version,
    about = "Smart-home sensor registry and migration runner"
)]
struct Cli {
    /// YAML or TOML config file.
    #[arg(short, long, global = true, env = "SMARTHOME_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sensor registry HTTP API
    Serve,
    /// Apply or inspect database migrations
    Migrate(MigrateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = ConfigLoader::load(cli.config.as_deref()).context("failed to load config")?;
    init_logging(&config.log);

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Migrate(args) => migrate::run(&args, &config, &mut std::io::stdout().lock()),
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    banner::print_banner(&config);
    info!("starting smarthome sensor registry");

    ApiServer::new(config)
        .run()
        .await
        .context("sensor registry server failed")?;
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(log: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
