//! Roster Value Service Library
//!
//! Ingests league snapshots, reconciles draft pick ownership into the pick
//! ledger, aggregates roster and pick values per manager, and writes power
//! rankings. The `roster-value` binary wires these pieces to configuration,
//! PostgreSQL, and JSON snapshot files.

use anyhow::{Context, Result};
use std::path::Path;

pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod retry;
pub mod source;
pub mod telemetry;

pub use config::ServiceConfig;
pub use database::Database;
pub use error::IngestError;
pub use logging::initialize_logging_with_config;
pub use pipeline::{IngestionPipeline, PipelineSettings};
pub use report::{BatchReport, IngestReport, LeagueFailure};
pub use retry::RetryPolicy;
pub use source::{JsonFileSource, LeagueSnapshot, Platform, PlatformSource, SourceError};

/// Load configuration from an optional file, the environment, and `.env`
pub fn load_configuration(path: Option<&Path>) -> Result<ServiceConfig> {
    config::load_config(path).context("Failed to load service configuration")
}
