//! Replisync Daemon - replica count synchronization controller
//!
//! The daemon provides:
//! - Watch-driven reconciliation of labeled primaries
//! - Periodic resync of every primary
//! - REST API over the resource store
//! - Event streaming for observability

use clap::Parser;
use replisync_daemon::error::{DaemonError, DaemonResult};
use replisync_daemon::{DaemonConfig, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Replisync Daemon CLI
#[derive(Parser)]
#[command(name = "replisyncd")]
#[command(about = "Replisync Daemon - keeps secondary sizes in sync with primary replicas", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "REPLISYNC_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "REPLISYNC_LISTEN_ADDR")]
    listen: Option<String>,

    /// Label on a primary naming its secondary
    #[arg(long, env = "REPLISYNC_LABEL_KEY")]
    label_key: Option<String>,

    /// Log level
    #[arg(long, env = "REPLISYNC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "REPLISYNC_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(label_key) = cli.label_key {
        config.controller.correlation_label_key = label_key;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // File, environment and flags are merged by now
    config.validate()?;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen_addr,
        workers = config.controller.workers,
        "Starting replisync daemon"
    );

    Server::new(config).run().await
}
