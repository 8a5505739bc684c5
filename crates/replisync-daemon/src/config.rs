//! Configuration for replisync-daemon

use crate::error::{DaemonError, DaemonResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Label key used when none is configured
pub const DEFAULT_CORRELATION_LABEL_KEY: &str = "replisync.io/associated-secondary-name";

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Controller configuration
    #[serde(default)]
    pub controller: ControllerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
        }
    }
}

/// Controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Label on a primary naming its secondary
    #[serde(default = "default_correlation_label_key")]
    pub correlation_label_key: String,

    /// Interval between full resyncs in seconds
    #[serde(default = "default_resync_interval")]
    pub resync_interval_secs: u64,

    /// Maximum concurrent reconciliations
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// First retry delay in milliseconds
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,

    /// Retry delay ceiling in seconds
    #[serde(default = "default_retry_max_delay")]
    pub retry_max_delay_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            correlation_label_key: default_correlation_label_key(),
            resync_interval_secs: default_resync_interval(),
            workers: default_workers(),
            retry_base_delay_ms: default_retry_base_delay(),
            retry_max_delay_secs: default_retry_max_delay(),
        }
    }
}

impl ControllerConfig {
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs.max(1))
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_secs(self.retry_max_delay_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8090))
}

fn default_correlation_label_key() -> String {
    DEFAULT_CORRELATION_LABEL_KEY.to_string()
}

fn default_resync_interval() -> u64 {
    30
}

fn default_workers() -> usize {
    4
}

fn default_retry_base_delay() -> u64 {
    100
}

fn default_retry_max_delay() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then optional file, then `REPLISYNC_` environment
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // REPLISYNC_CONTROLLER__WORKERS=8
        builder = builder.add_source(
            config::Environment::with_prefix("REPLISYNC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Reject settings that would leave the controller unable to work.
    /// Run after every source, CLI overrides included, has been applied.
    pub fn validate(&self) -> DaemonResult<()> {
        if self.controller.correlation_label_key.trim().is_empty() {
            return Err(DaemonError::Config(
                "controller.correlation_label_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
