//! Ingestion metrics and the Prometheus exporter

use crate::config::MetricsConfig;
use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

pub const LEAGUES_INGESTED: &str = "leagues_ingested_total";
pub const LEAGUE_FAILURES: &str = "league_ingest_failures_total";
pub const UNRESOLVED_PICKS: &str = "unresolved_picks_total";
pub const VALUATION_DUPLICATES: &str = "valuation_duplicates_total";
pub const INGEST_SECONDS: &str = "league_ingest_seconds";

/// Install the Prometheus exporter on `0.0.0.0:{port}` and register descriptions
pub fn install_exporter(config: &MetricsConfig) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;

    metrics::describe_counter!(LEAGUES_INGESTED, "Leagues ingested successfully");
    metrics::describe_counter!(LEAGUE_FAILURES, "League ingestions that failed");
    metrics::describe_counter!(UNRESOLVED_PICKS, "Picks stored with a fallback owner");
    metrics::describe_counter!(VALUATION_DUPLICATES, "Duplicate valuation rows collapsed");
    metrics::describe_histogram!(INGEST_SECONDS, "Wall time of one league ingestion");

    tracing::info!("Prometheus metrics exporter listening on {}", addr);
    Ok(())
}

pub fn record_success(unresolved: usize, elapsed: Duration) {
    metrics::increment_counter!(LEAGUES_INGESTED);
    metrics::counter!(UNRESOLVED_PICKS, unresolved as u64);
    metrics::histogram!(INGEST_SECONDS, elapsed.as_secs_f64());
}

pub fn record_failure() {
    metrics::increment_counter!(LEAGUE_FAILURES);
}

pub fn record_valuation_duplicates(collapsed: usize) {
    metrics::counter!(VALUATION_DUPLICATES, collapsed as u64);
}
