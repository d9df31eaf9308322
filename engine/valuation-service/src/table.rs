//! Deduplicated valuation tables and their sources

use crate::error::Result;
use crate::types::{RankType, RosterFormat, ValuationEntry, ValuationMatch};
use dashmap::DashMap;
use sqlx::PgPool;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Read-only value lookup used by the aggregator
pub trait ValuationLookup: Send + Sync {
    /// Value of a draft pick by canonical name
    fn pick_value(&self, canonical_name: &str) -> Option<ValuationMatch>;

    /// Value of a rostered player by player id
    fn player_value(&self, player_id: &str) -> Option<ValuationMatch>;
}

/// Valuations for one `(rank_type, roster_format)`, at most one row per key.
///
/// Player rows are indexed by player id, pick rows by name. Repeated
/// keys keep the highest value; equal values keep the first row seen.
#[derive(Debug, Clone)]
pub struct ValuationTable {
    rank_type: RankType,
    format: RosterFormat,
    by_name: HashMap<String, ValuationMatch>,
    by_player: HashMap<String, ValuationMatch>,
    duplicates_collapsed: usize,
}

impl ValuationTable {
    /// Build a table from raw rows; rows for other rank types are ignored
    pub fn build(rank_type: RankType, format: RosterFormat, entries: &[ValuationEntry]) -> Self {
        let mut table = Self {
            rank_type,
            format,
            by_name: HashMap::new(),
            by_player: HashMap::new(),
            duplicates_collapsed: 0,
        };

        for entry in entries.iter().filter(|e| e.rank_type == rank_type) {
            let candidate = ValuationMatch {
                value: entry.value_for(format),
                position_rank: entry.position_rank_for(format),
            };

            match entry.player_id.as_deref().filter(|id| !id.is_empty()) {
                Some(player_id) => {
                    if keep_max(&mut table.by_player, player_id, candidate) {
                        table.duplicates_collapsed += 1;
                        debug!("Collapsed duplicate valuation row for player {} ({})", player_id, rank_type);
                    }
                }
                None => {
                    if keep_max(&mut table.by_name, &entry.name, candidate) {
                        table.duplicates_collapsed += 1;
                        debug!("Collapsed duplicate valuation row for {} ({})", entry.name, rank_type);
                    }
                }
            }
        }

        table
    }

    pub fn rank_type(&self) -> RankType {
        self.rank_type
    }

    pub fn format(&self) -> RosterFormat {
        self.format
    }

    /// Rows dropped because their pick name or player id was already present
    pub fn duplicates_collapsed(&self) -> usize {
        self.duplicates_collapsed
    }

    pub fn len(&self) -> usize {
        self.by_name.len() + self.by_player.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty() && self.by_player.is_empty()
    }
}

/// Insert `candidate` under `key` unless an equal-or-higher value is there.
/// Returns true when the key was already present.
fn keep_max(map: &mut HashMap<String, ValuationMatch>, key: &str, candidate: ValuationMatch) -> bool {
    match map.get_mut(key) {
        Some(existing) => {
            if candidate.value > existing.value {
                *existing = candidate;
            }
            true
        }
        None => {
            map.insert(key.to_string(), candidate);
            false
        }
    }
}

impl ValuationLookup for ValuationTable {
    fn pick_value(&self, canonical_name: &str) -> Option<ValuationMatch> {
        self.by_name.get(canonical_name).copied()
    }

    fn player_value(&self, player_id: &str) -> Option<ValuationMatch> {
        self.by_player.get(player_id).copied()
    }
}

/// Where raw valuation rows come from
#[async_trait::async_trait]
pub trait ValuationSource: Send + Sync {
    /// All rows for one rank type
    async fn load(&self, rank_type: RankType) -> Result<Vec<ValuationEntry>>;
}

/// Fixed rows held in memory (for testing)
#[derive(Debug, Clone, Default)]
pub struct InMemoryValuationSource {
    entries: Vec<ValuationEntry>,
}

impl InMemoryValuationSource {
    pub fn new(entries: Vec<ValuationEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait::async_trait]
impl ValuationSource for InMemoryValuationSource {
    async fn load(&self, rank_type: RankType) -> Result<Vec<ValuationEntry>> {
        Ok(self.entries.iter().filter(|e| e.rank_type == rank_type).cloned().collect())
    }
}

/// Rows read from a JSON array of `ValuationEntry`
#[derive(Debug, Clone)]
pub struct JsonFileValuationSource {
    path: PathBuf,
}

impl JsonFileValuationSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl ValuationSource for JsonFileValuationSource {
    async fn load(&self, rank_type: RankType) -> Result<Vec<ValuationEntry>> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let entries: Vec<ValuationEntry> = serde_json::from_str(&raw)?;
        Ok(entries.into_iter().filter(|e| e.rank_type == rank_type).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ValuationRow {
    name: String,
    player_id: Option<String>,
    one_qb_value: i64,
    superflex_value: i64,
    one_qb_position_rank: Option<i32>,
    superflex_position_rank: Option<i32>,
}

/// Rows from the `valuation_entries` table
#[derive(Debug, Clone)]
pub struct PgValuationSource {
    pool: PgPool,
}

impl PgValuationSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ValuationSource for PgValuationSource {
    async fn load(&self, rank_type: RankType) -> Result<Vec<ValuationEntry>> {
        // Insertion order decides ties during dedup
        let rows: Vec<ValuationRow> = sqlx::query_as(
            "SELECT name, player_id, one_qb_value, superflex_value, \
             one_qb_position_rank, superflex_position_rank \
             FROM valuation_entries WHERE rank_type = $1 ORDER BY id",
        )
        .bind(rank_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ValuationEntry {
                name: row.name,
                player_id: row.player_id,
                rank_type,
                one_qb_value: row.one_qb_value,
                superflex_value: row.superflex_value,
                one_qb_position_rank: row.one_qb_position_rank,
                superflex_position_rank: row.superflex_position_rank,
            })
            .collect())
    }
}

/// Shared tables, one per `(rank_type, roster_format)`
pub struct ValuationCache {
    source: Arc<dyn ValuationSource>,
    tables: DashMap<(RankType, RosterFormat), Arc<ValuationTable>>,
}

impl ValuationCache {
    pub fn new(source: Arc<dyn ValuationSource>) -> Self {
        Self { source, tables: DashMap::new() }
    }

    /// Cached table, loading it from the source on first use
    pub async fn table(&self, rank_type: RankType, format: RosterFormat) -> Result<Arc<ValuationTable>> {
        if let Some(table) = self.tables.get(&(rank_type, format)) {
            return Ok(Arc::clone(table.value()));
        }

        let entries = self.source.load(rank_type).await?;
        let table = Arc::new(ValuationTable::build(rank_type, format, &entries));
        info!(
            "Loaded {} valuations for {} {:?} ({} duplicate rows collapsed)",
            table.len(),
            rank_type,
            format,
            table.duplicates_collapsed()
        );

        // A concurrent loader may have raced us; keep whichever landed first
        let cached = self.tables.entry((rank_type, format)).or_insert(table);
        Ok(Arc::clone(cached.value()))
    }

    /// Drop every cached table so the next call reloads
    pub fn invalidate(&self) {
        self.tables.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick_entry(name: &str, value: i64) -> ValuationEntry {
        ValuationEntry {
            name: name.to_string(),
            player_id: None,
            rank_type: RankType::Dynasty,
            one_qb_value: value / 2,
            superflex_value: value,
            one_qb_position_rank: None,
            superflex_position_rank: None,
        }
    }

    #[test]
    fn test_duplicates_keep_max_value() {
        let entries = vec![
            pick_entry("2026 Mid 2nd", 5000),
            pick_entry("2026 Mid 2nd", 5200),
            pick_entry("2026 Mid 2nd", 4800),
        ];
        let table = ValuationTable::build(RankType::Dynasty, RosterFormat::Superflex, &entries);

        assert_eq!(table.len(), 1);
        assert_eq!(table.duplicates_collapsed(), 2);
        assert_eq!(table.pick_value("2026 Mid 2nd").unwrap().value, 5200);
    }

    #[test]
    fn test_duplicate_tie_keeps_first() {
        let mut first = pick_entry("2026 Mid 1st", 7000);
        first.superflex_position_rank = Some(1);
        let mut second = pick_entry("2026 Mid 1st", 7000);
        second.superflex_position_rank = Some(2);

        let table = ValuationTable::build(RankType::Dynasty, RosterFormat::Superflex, &[first, second]);
        assert_eq!(table.pick_value("2026 Mid 1st").unwrap().position_rank, Some(1));
    }

    #[test]
    fn test_other_rank_type_ignored() {
        let mut redraft = pick_entry("2026 Mid 1st", 9000);
        redraft.rank_type = RankType::Redraft;
        let entries = vec![pick_entry("2026 Mid 1st", 7000), redraft];

        let table = ValuationTable::build(RankType::Dynasty, RosterFormat::Superflex, &entries);
        assert_eq!(table.pick_value("2026 Mid 1st").unwrap().value, 7000);
        assert_eq!(table.duplicates_collapsed(), 0);
    }

    #[test]
    fn test_player_index() {
        let mut player = pick_entry("Some Runner", 6100);
        player.player_id = Some("p-42".to_string());
        let table = ValuationTable::build(RankType::Dynasty, RosterFormat::OneQb, &[player]);

        assert_eq!(table.player_value("p-42").unwrap().value, 3050);
        assert!(table.player_value("p-43").is_none());
        assert!(table.pick_value("2026 Mid 1st").is_none());
    }

    #[test]
    fn test_players_sharing_a_name_are_distinct() {
        let mut first = pick_entry("Mike Williams", 3000);
        first.player_id = Some("p-1".to_string());
        let mut second = pick_entry("Mike Williams", 1200);
        second.player_id = Some("p-2".to_string());
        let mut shadow = pick_entry("2026 Mid 1st", 9000);
        shadow.player_id = Some("p-3".to_string());
        let entries = vec![first, second, shadow, pick_entry("2026 Mid 1st", 7000)];

        let table = ValuationTable::build(RankType::Dynasty, RosterFormat::Superflex, &entries);

        assert_eq!(table.duplicates_collapsed(), 0);
        assert_eq!(table.len(), 4);
        assert_eq!(table.player_value("p-2").unwrap().value, 1200);
        assert_eq!(table.pick_value("2026 Mid 1st").unwrap().value, 7000);
        assert!(table.pick_value("Mike Williams").is_none());
    }

    #[tokio::test]
    async fn test_cache_shares_tables() {
        let source = Arc::new(InMemoryValuationSource::new(vec![pick_entry("2026 Mid 2nd", 5000)]));
        let cache = ValuationCache::new(source);

        let a = cache.table(RankType::Dynasty, RosterFormat::Superflex).await.unwrap();
        let b = cache.table(RankType::Dynasty, RosterFormat::Superflex).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let one_qb = cache.table(RankType::Dynasty, RosterFormat::OneQb).await.unwrap();
        assert_eq!(one_qb.pick_value("2026 Mid 2nd").unwrap().value, 2500);

        cache.invalidate();
        let c = cache.table(RankType::Dynasty, RosterFormat::Superflex).await.unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn test_json_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.json");
        let body = serde_json::to_string(&vec![pick_entry("2027 Mid 1st", 6400)]).unwrap();
        tokio::fs::write(&path, body).await.unwrap();

        let source = JsonFileValuationSource::new(&path);
        let rows = source.load(RankType::Dynasty).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(source.load(RankType::Redraft).await.unwrap().is_empty());
    }
}
