//! League ingestion pipeline
//!
//! One league snapshot runs as a single sequential pass:
//! fetch, resolve pick ownership, replace the ledger snapshot, read it back,
//! aggregate values, then write power rankings. Many leagues run
//! concurrently, bounded by a semaphore; two runs for the same league
//! snapshot never overlap.

use crate::config::ServiceConfig;
use crate::error::{IngestError, Result};
use crate::report::{BatchReport, IngestReport, LeagueFailure};
use crate::retry::RetryPolicy;
use crate::source::{LeagueSnapshot, PlatformSource};
use crate::telemetry;
use chrono::Utc;
use dashmap::DashMap;
use pick_ledger::{CanonicalNamer, OwnershipResolver, PickLedger, ResolverConfig, TierPolicy};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};
use tracing::{error, info, instrument, warn};
use valuation_service::{
    RankSource, RankSummaryStore, RankSummaryWriter, RankType, RosterFormat, ValuationAggregator,
    ValuationCache, ValuationSource,
};

/// Settings the pipeline reads from `ServiceConfig`
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_round: u32,
    pub tier_policy: TierPolicy,
    pub base_pick_seasons: Vec<i32>,
    pub max_concurrent_leagues: usize,
    pub rank_type: RankType,
    pub default_roster_format: RosterFormat,
    pub rank_source: RankSource,
}

impl From<&ServiceConfig> for PipelineSettings {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            max_round: config.ingestion.max_round,
            tier_policy: config.ingestion.tier_policy,
            base_pick_seasons: config.ingestion.base_pick_seasons.clone(),
            max_concurrent_leagues: config.ingestion.max_concurrent_leagues.max(1),
            rank_type: config.valuation.rank_type,
            default_roster_format: config.valuation.roster_format,
            rank_source: config.valuation.rank_source,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&ServiceConfig::default())
    }
}

type SnapshotKey = (String, String);

pub struct IngestionPipeline {
    settings: PipelineSettings,
    source: Arc<dyn PlatformSource>,
    ledger: Arc<dyn PickLedger>,
    rank_writer: RankSummaryWriter,
    valuations: ValuationCache,
    retry: RetryPolicy,
    aggregator: ValuationAggregator,
    snapshot_locks: DashMap<SnapshotKey, Arc<Mutex<()>>>,
    reported_tables: DashMap<(RankType, RosterFormat), ()>,
    permits: Arc<Semaphore>,
}

impl IngestionPipeline {
    pub fn new(
        settings: PipelineSettings,
        source: Arc<dyn PlatformSource>,
        ledger: Arc<dyn PickLedger>,
        rank_store: Arc<dyn RankSummaryStore>,
        valuation_source: Arc<dyn ValuationSource>,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(settings.max_concurrent_leagues.max(1)));
        Self {
            rank_writer: RankSummaryWriter::new(rank_store, settings.rank_source),
            valuations: ValuationCache::new(valuation_source),
            retry: RetryPolicy::default(),
            aggregator: ValuationAggregator::new(),
            snapshot_locks: DashMap::new(),
            reported_tables: DashMap::new(),
            permits,
            settings,
            source,
            ledger,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Ingest one league snapshot end to end
    #[instrument(skip(self))]
    pub async fn ingest_league(&self, league_id: &str, snapshot_id: &str) -> Result<IngestReport> {
        let lock = self.snapshot_lock(league_id, snapshot_id);
        let result = {
            let _guard = lock.lock().await;
            self.ingest_locked(league_id, snapshot_id).await
        };
        drop(lock);
        self.release_snapshot_lock(league_id, snapshot_id);
        result
    }

    async fn ingest_locked(&self, league_id: &str, snapshot_id: &str) -> Result<IngestReport> {
        let started_at = Utc::now();
        let timer = Instant::now();

        match self.run_league(league_id, snapshot_id, started_at).await {
            Ok(report) => {
                telemetry::record_success(report.unresolved_picks, timer.elapsed());
                info!(
                    "Ingested league {} snapshot {}: {} picks, {} unresolved, {} managers ranked in {}ms",
                    league_id,
                    snapshot_id,
                    report.records_written,
                    report.unresolved_picks,
                    report.ranks.len(),
                    report.duration_ms()
                );
                Ok(report)
            }
            Err(e) => {
                telemetry::record_failure();
                error!("Ingestion of league {} snapshot {} failed: {}", league_id, snapshot_id, e);
                Err(e)
            }
        }
    }

    async fn run_league(
        &self,
        league_id: &str,
        snapshot_id: &str,
        started_at: chrono::DateTime<Utc>,
    ) -> Result<IngestReport> {
        let snapshot = self.fetch_snapshot(league_id).await?;

        let resolver = self.resolver_for(&snapshot);
        let resolution = resolver.resolve(league_id, snapshot_id, &snapshot.facts, &snapshot.managers);
        if resolution.dropped_facts > 0 {
            warn!(
                "Dropped {} ownership facts outside rounds 1..={} for league {}",
                resolution.dropped_facts, self.settings.max_round, league_id
            );
        }

        let records_written =
            self.ledger.replace_snapshot(league_id, snapshot_id, resolution.records.clone()).await?;
        let picks = self.ledger.get(league_id, snapshot_id).await?;

        let roster_format = snapshot.roster_format.unwrap_or(self.settings.default_roster_format);
        let table = self.valuations.table(self.settings.rank_type, roster_format).await?;
        if self.reported_tables.insert((self.settings.rank_type, roster_format), ()).is_none() {
            telemetry::record_valuation_duplicates(table.duplicates_collapsed());
        }

        let outcome = self.aggregator.aggregate(
            league_id,
            &snapshot.managers,
            &picks,
            &snapshot.roster,
            table.as_ref(),
        );
        let ranks = self.rank_writer.write(league_id, &outcome.aggregates).await?;

        Ok(IngestReport {
            league_id: league_id.to_string(),
            snapshot_id: snapshot_id.to_string(),
            platform: snapshot.platform,
            rank_type: self.settings.rank_type,
            roster_format,
            rank_source: self.settings.rank_source,
            records_written,
            facts_dropped: resolution.dropped_facts,
            conflicting_facts: resolution.conflicting_facts,
            unresolved_picks: resolution.unresolved,
            synthesized_picks: resolution.synthesized,
            unmatched_picks: outcome.unmatched_picks,
            unmatched_players: outcome.unmatched_players,
            valuation_duplicates: table.duplicates_collapsed(),
            aggregates: outcome.aggregates,
            ranks,
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn fetch_snapshot(&self, league_id: &str) -> Result<LeagueSnapshot> {
        let label = format!("fetch league {league_id}");
        let snapshot = self
            .retry
            .run(&label, || self.source.fetch(league_id))
            .await
            .map_err(|failure| failure.error.into_ingest_error(league_id, failure.attempts))?;

        if snapshot.league_id != league_id {
            return Err(IngestError::SourceRejected {
                league_id: league_id.to_string(),
                message: format!("source returned league {}", snapshot.league_id),
            });
        }

        Ok(snapshot)
    }

    fn resolver_for(&self, snapshot: &LeagueSnapshot) -> OwnershipResolver {
        let draft_order =
            if snapshot.platform.reports_draft_order() { snapshot.draft_order.clone() } else { None };
        let namer = CanonicalNamer::from_policy(self.settings.tier_policy, draft_order);

        let base_pick_seasons = if snapshot.platform.reports_pick_ownership() {
            Vec::new()
        } else {
            self.settings.base_pick_seasons.clone()
        };

        OwnershipResolver::new(
            ResolverConfig { max_round: self.settings.max_round, base_pick_seasons },
            namer,
        )
    }

    fn snapshot_lock(&self, league_id: &str, snapshot_id: &str) -> Arc<Mutex<()>> {
        self.snapshot_locks
            .entry((league_id.to_string(), snapshot_id.to_string()))
            .or_default()
            .clone()
    }

    /// Forget the lock once no other run holds or waits on it
    fn release_snapshot_lock(&self, league_id: &str, snapshot_id: &str) {
        let key = (league_id.to_string(), snapshot_id.to_string());
        self.snapshot_locks.remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Ingest many leagues concurrently under the configured limit.
    ///
    /// A failing league is reported and does not affect the others.
    pub async fn ingest_leagues(self: &Arc<Self>, league_ids: Vec<String>, snapshot_id: &str) -> BatchReport {
        info!(
            "Ingesting {} leagues for snapshot {} (max {} concurrent)",
            league_ids.len(),
            snapshot_id,
            self.settings.max_concurrent_leagues
        );

        let handles: Vec<_> = league_ids
            .into_iter()
            .map(|league_id| {
                let pipeline = Arc::clone(self);
                let permits = Arc::clone(&self.permits);
                let snapshot_id = snapshot_id.to_string();
                let task_league = league_id.clone();
                let handle = tokio::spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|_| IngestError::SchedulerClosed { league_id: task_league.clone() })?;
                    pipeline.ingest_league(&task_league, &snapshot_id).await
                });
                (league_id, handle)
            })
            .collect();

        let (ids, handles): (Vec<String>, Vec<_>) = handles.into_iter().unzip();
        let results = futures::future::join_all(handles).await;

        let mut batch = BatchReport::default();
        for (league_id, result) in ids.into_iter().zip(results) {
            match result.map_err(IngestError::from).and_then(|inner| inner) {
                Ok(report) => batch.succeeded.push(report),
                Err(e) => batch.failed.push(LeagueFailure { league_id, error: e.to_string() }),
            }
        }

        info!(
            "Snapshot {} finished: {} leagues succeeded, {} failed",
            snapshot_id,
            batch.succeeded.len(),
            batch.failed.len()
        );

        batch
    }
}
