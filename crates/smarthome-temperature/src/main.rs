use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "temperature-api",
    version,
    about = "Mock temperature API emitting randomized readings"
)]
struct Args {
    /// Address to bind.
    #[arg(long, env = "TEMPERATURE_API_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(short, long, env = "TEMPERATURE_API_PORT", default_value_t = 8081)]
    port: u16,

    /// Used when RUST_LOG is unset.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("temperature API listening on {}", addr);

    smarthome_temperature::serve(listener, shutdown_signal())
        .await
        .context("temperature API server failed")?;

    info!("temperature API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl+c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down temperature API...");
}
