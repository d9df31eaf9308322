//! Valuation Service - roster and draft pick value aggregation
//!
//! Joins resolved pick ledgers and rosters against market valuations to
//! produce per-manager totals, then ranks managers per metric and writes the
//! ranks into a per-source rank summary.

pub mod aggregator;
pub mod error;
pub mod ranking;
pub mod table;
pub mod types;

pub use aggregator::{AggregationOutcome, ValuationAggregator};
pub use error::{Result, ValuationError};
pub use ranking::{
    competition_ranks, rank_managers, InMemoryRankSummaryStore, PgRankSummaryStore,
    RankSummaryStore, RankSummaryWriter,
};
pub use table::{
    InMemoryValuationSource, JsonFileValuationSource, PgValuationSource, ValuationCache,
    ValuationLookup, ValuationSource, ValuationTable,
};
pub use types::{
    ManagerAggregate, ManagerRanks, Metric, RankSet, RankSource, RankType, RosterEntry,
    RosterFormat, RosterSlot, ValuationEntry, ValuationMatch,
};
