//! Power rankings and the rank summary store

use crate::error::{Result, ValuationError};
use crate::types::{ManagerAggregate, ManagerRanks, Metric, RankSet, RankSource};
use pick_ledger::ManagerId;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Standard competition ranks (1, 1, 3) for `(manager_id, value)` pairs,
/// highest value first. Equal values are listed by manager id.
pub fn competition_ranks(values: &[(ManagerId, i64)]) -> Vec<(ManagerId, u32)> {
    let mut sorted: Vec<&(ManagerId, i64)> = values.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut ranks = Vec::with_capacity(sorted.len());
    let mut current_rank = 0;
    let mut previous: Option<i64> = None;

    for (position, (manager_id, value)) in sorted.into_iter().enumerate() {
        if previous != Some(*value) {
            current_rank = position as u32 + 1;
            previous = Some(*value);
        }
        ranks.push((manager_id.clone(), current_rank));
    }

    ranks
}

/// Rank every manager on every metric
pub fn rank_managers(aggregates: &[ManagerAggregate]) -> Vec<ManagerRanks> {
    let mut sets: HashMap<&str, RankSet> = HashMap::new();

    for metric in Metric::ALL {
        let values: Vec<(ManagerId, i64)> =
            aggregates.iter().map(|a| (a.manager_id.clone(), a.metric(metric))).collect();
        for (manager_id, rank) in competition_ranks(&values) {
            if let Some(aggregate) = aggregates.iter().find(|a| a.manager_id == manager_id) {
                sets.entry(aggregate.manager_id.as_str()).or_default().set(metric, rank);
            }
        }
    }

    aggregates
        .iter()
        .map(|a| ManagerRanks {
            manager_id: a.manager_id.clone(),
            league_id: a.league_id.clone(),
            ranks: sets.get(a.manager_id.as_str()).copied().unwrap_or_default(),
        })
        .collect()
}

/// Storage for per-source rank columns keyed by `(manager_id, league_id)`
#[async_trait::async_trait]
pub trait RankSummaryStore: Send + Sync {
    /// Upsert ranks for one source; other sources' ranks stay as they are
    async fn upsert_ranks(&self, source: RankSource, ranks: &[ManagerRanks]) -> Result<usize>;

    /// Stored ranks for a manager and source, if any
    async fn get_ranks(
        &self,
        manager_id: &str,
        league_id: &str,
        source: RankSource,
    ) -> Result<Option<RankSet>>;
}

type SummaryKey = (ManagerId, String);

/// In-memory rank summary store (for testing and dry runs)
#[derive(Debug, Clone, Default)]
pub struct InMemoryRankSummaryStore {
    rows: Arc<RwLock<HashMap<SummaryKey, HashMap<RankSource, RankSet>>>>,
}

impl InMemoryRankSummaryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RankSummaryStore for InMemoryRankSummaryStore {
    async fn upsert_ranks(&self, source: RankSource, ranks: &[ManagerRanks]) -> Result<usize> {
        let mut rows = self.rows.write().await;
        for row in ranks {
            rows.entry((row.manager_id.clone(), row.league_id.clone()))
                .or_default()
                .insert(source, row.ranks);
        }
        Ok(ranks.len())
    }

    async fn get_ranks(
        &self,
        manager_id: &str,
        league_id: &str,
        source: RankSource,
    ) -> Result<Option<RankSet>> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(&(manager_id.to_string(), league_id.to_string()))
            .and_then(|sources| sources.get(&source))
            .copied())
    }
}

/// Rank summary stored in the `ranks_summary` table
#[derive(Debug, Clone)]
pub struct PgRankSummaryStore {
    pool: PgPool,
}

impl PgRankSummaryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the valuation and rank tables if needed
    pub async fn migrate(&self) -> Result<()> {
        let mut migrator = sqlx::migrate!("./migrations");
        migrator.set_ignore_missing(true);
        migrator.run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RankSummaryStore for PgRankSummaryStore {
    async fn upsert_ranks(&self, source: RankSource, ranks: &[ManagerRanks]) -> Result<usize> {
        if ranks.is_empty() {
            return Ok(0);
        }

        // Column names come from the closed RankSource enum only
        let [power, starters, bench, picks] = source.rank_columns();

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "INSERT INTO ranks_summary (manager_id, league_id, {power}, {starters}, {bench}, {picks}, updated_at) "
        ));
        builder.push_values(ranks, |mut row, entry| {
            row.push_bind(&entry.manager_id)
                .push_bind(&entry.league_id)
                .push_bind(entry.ranks.power as i32)
                .push_bind(entry.ranks.starters as i32)
                .push_bind(entry.ranks.bench as i32)
                .push_bind(entry.ranks.picks as i32)
                .push("NOW()");
        });
        builder.push(format!(
            " ON CONFLICT (manager_id, league_id) DO UPDATE SET \
             {power} = EXCLUDED.{power}, \
             {starters} = EXCLUDED.{starters}, \
             {bench} = EXCLUDED.{bench}, \
             {picks} = EXCLUDED.{picks}, \
             updated_at = EXCLUDED.updated_at"
        ));

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() as usize)
    }

    async fn get_ranks(
        &self,
        manager_id: &str,
        league_id: &str,
        source: RankSource,
    ) -> Result<Option<RankSet>> {
        let [power, starters, bench, picks] = source.rank_columns();
        let query = format!(
            "SELECT {power}, {starters}, {bench}, {picks} FROM ranks_summary \
             WHERE manager_id = $1 AND league_id = $2"
        );

        let row: Option<(Option<i32>, Option<i32>, Option<i32>, Option<i32>)> = sqlx::query_as(&query)
            .bind(manager_id)
            .bind(league_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|(power, starters, bench, picks)| {
            Some(RankSet {
                power: u32::try_from(power?).ok()?,
                starters: u32::try_from(starters?).ok()?,
                bench: u32::try_from(bench?).ok()?,
                picks: u32::try_from(picks?).ok()?,
            })
        }))
    }
}

/// Computes rankings for a league and writes them for one source
pub struct RankSummaryWriter {
    store: Arc<dyn RankSummaryStore>,
    source: RankSource,
}

impl RankSummaryWriter {
    pub fn new(store: Arc<dyn RankSummaryStore>, source: RankSource) -> Self {
        Self { store, source }
    }

    pub fn source(&self) -> RankSource {
        self.source
    }

    /// Rank `aggregates` (all from `league_id`) and upsert the result
    pub async fn write(&self, league_id: &str, aggregates: &[ManagerAggregate]) -> Result<Vec<ManagerRanks>> {
        if let Some(stray) = aggregates.iter().find(|a| a.league_id != league_id) {
            return Err(ValuationError::LeagueMismatch {
                expected: league_id.to_string(),
                found: stray.league_id.clone(),
            });
        }

        let ranks = rank_managers(aggregates);
        self.store.upsert_ranks(self.source, &ranks).await?;

        tracing::info!(
            "Wrote {} power rankings for league {} (source {})",
            ranks.len(),
            league_id,
            self.source
        );

        Ok(ranks)
    }
}
