//! Service configuration management

use anyhow::{Context, Result};
use pick_ledger::{TierPolicy, DEFAULT_MAX_ROUND};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use valuation_service::{RankSource, RankType, RosterFormat};

/// Prefix for nested environment overrides, e.g. `ROSTER_VALUE__RETRY__MAX_ATTEMPTS`
pub const ENV_PREFIX: &str = "ROSTER_VALUE";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub database: DatabaseConfig,
    pub ingestion: IngestionConfig,
    pub retry: RetryConfig,
    pub valuation: ValuationConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// PostgreSQL connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Run schema migrations at startup
    pub run_migrations: bool,
}

/// Pick resolution and scheduling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Highest draft round kept in the ledger
    pub max_round: u32,

    /// How picks are tiered when the platform publishes draft order
    pub tier_policy: TierPolicy,

    /// Future seasons to synthesize untraded picks for on platforms without pick data
    pub base_pick_seasons: Vec<i32>,

    /// Leagues ingested at the same time
    pub max_concurrent_leagues: usize,
}

/// Backoff for platform calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

/// Which market values are used and where ranks are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    pub rank_type: RankType,
    /// Used when a league snapshot does not state its own format
    pub roster_format: RosterFormat,
    pub rank_source: RankSource,
    /// Load values from this JSON file instead of the database
    pub values_file: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,

    /// Include file and line in log lines
    pub with_location: bool,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Install the Prometheus exporter
    pub enabled: bool,

    /// Metrics export port
    pub port: u16,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost:5432/roster_value".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 30,
            run_migrations: true,
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_round: DEFAULT_MAX_ROUND,
            tier_policy: TierPolicy::AlwaysMid,
            base_pick_seasons: vec![2025, 2026, 2027],
            max_concurrent_leagues: 8,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 5, base_delay_ms: 1000, multiplier: 2.0, max_delay_ms: 60_000 }
    }
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            rank_type: RankType::Dynasty,
            roster_format: RosterFormat::Superflex,
            rank_source: RankSource::Sf,
            values_file: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string(), with_location: false }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: false, port: 9090 }
    }
}

/// Load configuration: defaults, then the optional TOML file, then
/// `ROSTER_VALUE__SECTION__KEY` variables, then the flat overrides
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    let defaults = config::Config::try_from(&ServiceConfig::default())
        .context("Failed to serialize default configuration")?;

    let mut builder = config::Config::builder().add_source(defaults);

    if let Some(path) = path {
        tracing::debug!("Loading configuration from file: {:?}", path);
        builder = builder.add_source(config::File::from(path).required(true));
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("ingestion.base_pick_seasons")
            .try_parsing(true),
    );

    let mut config: ServiceConfig = builder
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    load_from_env(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Flat environment overrides kept for deployment convenience
fn load_from_env(config: &mut ServiceConfig) {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database.url = url;
    }

    if let Ok(level) = std::env::var("ROSTER_VALUE_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Ok(format) = std::env::var("ROSTER_VALUE_LOG_FORMAT") {
        config.logging.format = format;
    }
}

/// Validate configuration
pub fn validate_config(config: &ServiceConfig) -> Result<()> {
    EnvFilter::try_new(&config.logging.level)
        .map_err(|e| anyhow::anyhow!("Invalid log level: {} ({})", config.logging.level, e))?;

    match config.logging.format.as_str() {
        "json" | "pretty" | "compact" => {}
        _ => return Err(anyhow::anyhow!("Invalid log format: {}", config.logging.format)),
    }

    if config.ingestion.max_round == 0 {
        return Err(anyhow::anyhow!("ingestion.max_round must be at least 1"));
    }

    if config.ingestion.max_concurrent_leagues == 0 {
        return Err(anyhow::anyhow!("ingestion.max_concurrent_leagues must be at least 1"));
    }

    if config.retry.max_attempts == 0 {
        return Err(anyhow::anyhow!("retry.max_attempts must be at least 1"));
    }

    if config.retry.multiplier < 1.0 {
        return Err(anyhow::anyhow!("retry.multiplier must be >= 1.0, got {}", config.retry.multiplier));
    }

    if config.database.min_connections > config.database.max_connections {
        return Err(anyhow::anyhow!(
            "database.min_connections ({}) exceeds max_connections ({})",
            config.database.min_connections,
            config.database.max_connections
        ));
    }

    if config.metrics.enabled && config.metrics.port == 0 {
        return Err(anyhow::anyhow!("Invalid metrics port: {}", config.metrics.port));
    }

    Ok(())
}
