//! PostgreSQL-backed pick ledger

use crate::error::{LedgerError, Result};
use crate::ledger::{prepare_snapshot, PickLedger};
use crate::types::{DraftPickRecord, PickKey, RoundTier};
use sqlx::{PgPool, Postgres, QueryBuilder};

/// Rows per INSERT statement; keeps bind count well below the Postgres limit
const INSERT_CHUNK_SIZE: usize = 1000;

#[derive(Debug, sqlx::FromRow)]
struct PickRow {
    league_id: String,
    snapshot_id: String,
    season: i32,
    round: i32,
    round_tier: String,
    original_owner_id: String,
    current_owner_id: String,
    unresolved: bool,
}

impl PickRow {
    fn into_record(self) -> Result<DraftPickRecord> {
        let tier: RoundTier = self.round_tier.parse()?;
        let round = u32::try_from(self.round)
            .map_err(|_| LedgerError::invalid_record(format!("negative round {}", self.round)))?;
        let key = PickKey { season: self.season, round, original_owner_id: self.original_owner_id };

        let record =
            DraftPickRecord::new(self.league_id, self.snapshot_id, key, self.current_owner_id, tier);
        Ok(if self.unresolved { record.flagged_unresolved() } else { record })
    }
}

/// Pick ledger stored in the `draft_pick_ledger` table
#[derive(Debug, Clone)]
pub struct PgPickLedger {
    pool: PgPool,
}

impl PgPickLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the ledger table if needed
    pub async fn migrate(&self) -> Result<()> {
        let mut migrator = sqlx::migrate!("./migrations");
        migrator.set_ignore_missing(true);
        migrator.run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl PickLedger for PgPickLedger {
    async fn replace_snapshot(
        &self,
        league_id: &str,
        snapshot_id: &str,
        records: Vec<DraftPickRecord>,
    ) -> Result<usize> {
        let prepared = prepare_snapshot(league_id, snapshot_id, records)?;

        // Dropping the transaction on any error below rolls it back
        let mut tx = self.pool.begin().await?;

        // Serialize concurrent replaces of the same snapshot across processes
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("{league_id}:{snapshot_id}"))
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM draft_pick_ledger WHERE league_id = $1 AND snapshot_id = $2")
            .bind(league_id)
            .bind(snapshot_id)
            .execute(&mut *tx)
            .await?;

        for chunk in prepared.chunks(INSERT_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO draft_pick_ledger (league_id, snapshot_id, season, round, round_tier, \
                 original_owner_id, current_owner_id, canonical_name, unresolved) ",
            );
            builder.push_values(chunk, |mut row, record| {
                row.push_bind(&record.league_id)
                    .push_bind(&record.snapshot_id)
                    .push_bind(record.season)
                    .push_bind(record.round as i32)
                    .push_bind(record.round_tier().as_str())
                    .push_bind(&record.original_owner_id)
                    .push_bind(&record.current_owner_id)
                    .push_bind(record.canonical_name())
                    .push_bind(record.unresolved);
            });
            builder.push(
                " ON CONFLICT (league_id, snapshot_id, season, round, original_owner_id) DO UPDATE SET \
                 round_tier = EXCLUDED.round_tier, \
                 current_owner_id = EXCLUDED.current_owner_id, \
                 canonical_name = EXCLUDED.canonical_name, \
                 unresolved = EXCLUDED.unresolved, \
                 updated_at = NOW()",
            );
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Stored {} draft pick records for league {} snapshot {}",
            prepared.len(),
            league_id,
            snapshot_id
        );

        Ok(prepared.len())
    }

    async fn get(&self, league_id: &str, snapshot_id: &str) -> Result<Vec<DraftPickRecord>> {
        let rows: Vec<PickRow> = sqlx::query_as(
            "SELECT league_id, snapshot_id, season, round, round_tier, original_owner_id, \
             current_owner_id, unresolved \
             FROM draft_pick_ledger \
             WHERE league_id = $1 AND snapshot_id = $2 \
             ORDER BY season, round, original_owner_id COLLATE \"C\"",
        )
        .bind(league_id)
        .bind(snapshot_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PickRow::into_record).collect()
    }
}
