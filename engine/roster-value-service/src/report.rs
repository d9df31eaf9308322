//! Per-league ingestion reports

use chrono::{DateTime, Utc};
use serde::Serialize;
use valuation_service::{ManagerAggregate, ManagerRanks, RankSource, RankType, RosterFormat};

use crate::source::Platform;

/// What one league ingestion did
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub league_id: String,
    pub snapshot_id: String,
    pub platform: Platform,
    pub rank_type: RankType,
    pub roster_format: RosterFormat,
    pub rank_source: RankSource,

    pub records_written: usize,
    pub facts_dropped: usize,
    pub conflicting_facts: usize,
    pub unresolved_picks: usize,
    pub synthesized_picks: usize,
    pub unmatched_picks: usize,
    pub unmatched_players: usize,
    pub valuation_duplicates: usize,

    pub aggregates: Vec<ManagerAggregate>,
    pub ranks: Vec<ManagerRanks>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl IngestReport {
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Outcome of a multi-league run
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<IngestReport>,
    pub failed: Vec<LeagueFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeagueFailure {
    pub league_id: String,
    pub error: String,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
