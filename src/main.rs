//! steady-http: serve the built-in router under the supervised server.
//!
//! Initializes tracing, loads configuration (defaults when no file is
//! given), and runs until SIGINT/SIGTERM.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use steady_http::config::{load_config, AppConfig};
use steady_http::http::routes::default_router;
use steady_http::ServerBuilder;

/// Supervised HTTP server with graceful shutdown
#[derive(Parser, Debug)]
#[command(name = "steady-http", version, about)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level filter (e.g., "steady_http=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    // Priority: CLI > env > config
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| config.observability.log_level.clone());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        bind_address = %config.server.bind_address,
        read_timeout_secs = config.server.read_timeout_secs,
        write_timeout_secs = config.server.write_timeout_secs,
        shutdown_grace_secs = config.server.shutdown_grace_secs,
        "Configuration loaded"
    );

    let server = ServerBuilder::from_config(&config.server)
        .build(config.server.bind_address.clone(), default_router());
    server.run().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
