//! Roster Value ingestion binary
//!
//! Reads league snapshots, reconciles draft pick ownership, values every
//! roster and writes power rankings. With `--dry-run` everything is kept in
//! memory and only the report is printed.

use anyhow::{Context, Result};
use clap::Parser;
use pick_ledger::{InMemoryPickLedger, PickLedger};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use valuation_service::{
    InMemoryRankSummaryStore, InMemoryValuationSource, JsonFileValuationSource, RankSummaryStore,
    ValuationSource,
};

use roster_value_service::{
    initialize_logging_with_config, load_configuration, telemetry, Database, IngestionPipeline,
    JsonFileSource, PipelineSettings, PlatformSource,
};

/// Reconcile draft picks and value league rosters
#[derive(Parser, Debug)]
#[command(name = "roster-value")]
#[command(version, about = "Draft pick reconciliation and roster valuation")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// League snapshot JSON file; repeat for several files
    #[arg(short, long = "snapshot-file", required = true)]
    snapshot_files: Vec<PathBuf>,

    /// Only ingest these leagues (default: every league in the snapshot files)
    #[arg(short, long = "league")]
    leagues: Vec<String>,

    /// Snapshot id to store picks under (default: a fresh UUID)
    #[arg(long)]
    snapshot_id: Option<String>,

    /// Valuation JSON file, overrides `valuation.values_file`
    #[arg(long)]
    values_file: Option<PathBuf>,

    /// Keep the ledger and rankings in memory instead of PostgreSQL
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_configuration(cli.config.as_deref())?;
    if let Some(values_file) = cli.values_file.clone() {
        config.valuation.values_file = Some(values_file);
    }

    initialize_logging_with_config(&config.logging)?;
    info!("Starting roster-value v{}", env!("CARGO_PKG_VERSION"));

    if config.metrics.enabled {
        telemetry::install_exporter(&config.metrics)?;
    }

    let source = Arc::new(JsonFileSource::new(cli.snapshot_files.clone()));
    let league_ids = if cli.leagues.is_empty() {
        source.league_ids().await.map_err(|e| anyhow::anyhow!("Failed to list leagues: {e}"))?
    } else {
        cli.leagues.clone()
    };
    let snapshot_id = cli.snapshot_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut database = None;
    let (ledger, rank_store, db_values): (
        Arc<dyn PickLedger>,
        Arc<dyn RankSummaryStore>,
        Option<Arc<dyn ValuationSource>>,
    ) = if cli.dry_run {
        info!("Dry run: ledger and rankings are kept in memory");
        (
            Arc::new(InMemoryPickLedger::new()) as Arc<dyn PickLedger>,
            Arc::new(InMemoryRankSummaryStore::new()) as Arc<dyn RankSummaryStore>,
            None,
        )
    } else {
        let db = Database::connect(&config.database).await.context("Failed to connect to database")?;
        if config.database.run_migrations {
            db.migrate().await.context("Failed to run migrations")?;
        }
        let stores = (
            Arc::new(db.pick_ledger()) as Arc<dyn PickLedger>,
            Arc::new(db.rank_store()) as Arc<dyn RankSummaryStore>,
            Some(Arc::new(db.valuation_source()) as Arc<dyn ValuationSource>),
        );
        database = Some(db);
        stores
    };

    let valuation_source: Arc<dyn ValuationSource> = match (&config.valuation.values_file, db_values) {
        (Some(path), _) => Arc::new(JsonFileValuationSource::new(path.clone())) as Arc<dyn ValuationSource>,
        (None, Some(db_values)) => db_values,
        (None, None) => {
            warn!("No valuation source configured; every value will be zero");
            Arc::new(InMemoryValuationSource::default()) as Arc<dyn ValuationSource>
        }
    };

    let pipeline = IngestionPipeline::new(
        PipelineSettings::from(&config),
        source,
        ledger,
        rank_store,
        valuation_source,
    )
    .with_retry_policy((&config.retry).into());
    let pipeline = Arc::new(pipeline);

    let batch = pipeline.ingest_leagues(league_ids, &snapshot_id).await;

    println!("{}", serde_json::to_string_pretty(&batch).context("Failed to serialize report")?);

    if let Some(db) = database {
        db.close().await;
    }

    if !batch.is_success() {
        for failure in &batch.failed {
            error!("League {} failed: {}", failure.league_id, failure.error);
        }
        anyhow::bail!(
            "{} of {} leagues failed",
            batch.failed.len(),
            batch.failed.len() + batch.succeeded.len()
        );
    }

    info!("roster-value finished snapshot {}", snapshot_id);
    Ok(())
}
