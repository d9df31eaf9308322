//! Pick ledger trait and in-memory implementation

use crate::error::{LedgerError, Result};
use crate::types::{DraftPickRecord, PickKey};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage for resolved pick records, scoped by `(league_id, snapshot_id)`
#[async_trait::async_trait]
pub trait PickLedger: Send + Sync {
    /// Replace every record of a snapshot with `records` as one atomic unit.
    ///
    /// Records sharing a pick key collapse to the last one given. Returns the
    /// number of records now stored for the snapshot.
    async fn replace_snapshot(
        &self,
        league_id: &str,
        snapshot_id: &str,
        records: Vec<DraftPickRecord>,
    ) -> Result<usize>;

    /// All records for a snapshot, ordered by `(season, round, original_owner_id)`
    async fn get(&self, league_id: &str, snapshot_id: &str) -> Result<Vec<DraftPickRecord>>;
}

/// Check every record belongs to the snapshot being replaced and collapse
/// duplicate keys, last write wins. Output is in key order.
pub fn prepare_snapshot(
    league_id: &str,
    snapshot_id: &str,
    records: Vec<DraftPickRecord>,
) -> Result<Vec<DraftPickRecord>> {
    let mut by_key: BTreeMap<PickKey, DraftPickRecord> = BTreeMap::new();

    for record in records {
        if record.league_id != league_id || record.snapshot_id != snapshot_id {
            return Err(LedgerError::ScopeMismatch {
                expected_league: league_id.to_string(),
                expected_snapshot: snapshot_id.to_string(),
                found_league: record.league_id,
                found_snapshot: record.snapshot_id,
            });
        }
        if record.original_owner_id.is_empty() || record.current_owner_id.is_empty() {
            return Err(LedgerError::invalid_record(format!(
                "empty owner on {} {}",
                record.league_id,
                record.canonical_name()
            )));
        }
        by_key.insert(record.key(), record);
    }

    Ok(by_key.into_values().collect())
}

/// In-memory pick ledger (for testing and dry runs)
#[derive(Debug, Clone, Default)]
pub struct InMemoryPickLedger {
    snapshots: Arc<RwLock<HashMap<(String, String), Vec<DraftPickRecord>>>>,
}

impl InMemoryPickLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots
    pub async fn snapshot_count(&self) -> usize {
        self.snapshots.read().await.len()
    }
}

#[async_trait::async_trait]
impl PickLedger for InMemoryPickLedger {
    async fn replace_snapshot(
        &self,
        league_id: &str,
        snapshot_id: &str,
        records: Vec<DraftPickRecord>,
    ) -> Result<usize> {
        // Validate before touching stored state so a bad batch leaves the old snapshot readable
        let prepared = prepare_snapshot(league_id, snapshot_id, records)?;
        let count = prepared.len();

        let mut snapshots = self.snapshots.write().await;
        snapshots.insert((league_id.to_string(), snapshot_id.to_string()), prepared);

        tracing::debug!("Replaced {} pick records for {}/{}", count, league_id, snapshot_id);

        Ok(count)
    }

    async fn get(&self, league_id: &str, snapshot_id: &str) -> Result<Vec<DraftPickRecord>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .get(&(league_id.to_string(), snapshot_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
