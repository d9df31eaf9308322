//! Valuation and ranking types

use crate::error::ValuationError;
use pick_ledger::ManagerId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Market the values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankType {
    #[default]
    Dynasty,
    Redraft,
}

impl RankType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankType::Dynasty => "dynasty",
            RankType::Redraft => "redraft",
        }
    }
}

impl fmt::Display for RankType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankType {
    type Err = std::convert::Infallible;

    /// Anything other than "dynasty" is treated as redraft
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("dynasty") {
            Ok(RankType::Dynasty)
        } else {
            Ok(RankType::Redraft)
        }
    }
}

/// League starting-lineup format; decides which value column applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterFormat {
    OneQb,
    #[default]
    Superflex,
}

impl FromStr for RosterFormat {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "superflex" | "sf" => Ok(RosterFormat::Superflex),
            "oneqb" | "1qb" => Ok(RosterFormat::OneQb),
            _ => Err(ValuationError::UnknownRosterFormat(s.to_string())),
        }
    }
}

/// One market value row, for a draft pick (by canonical name) or a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationEntry {
    /// Canonical pick name or player display name
    pub name: String,
    /// Platform-independent player id; picks have none
    #[serde(default)]
    pub player_id: Option<String>,
    pub rank_type: RankType,
    pub one_qb_value: i64,
    pub superflex_value: i64,
    #[serde(default)]
    pub one_qb_position_rank: Option<i32>,
    #[serde(default)]
    pub superflex_position_rank: Option<i32>,
}

impl ValuationEntry {
    pub fn value_for(&self, format: RosterFormat) -> i64 {
        match format {
            RosterFormat::OneQb => self.one_qb_value,
            RosterFormat::Superflex => self.superflex_value,
        }
    }

    pub fn position_rank_for(&self, format: RosterFormat) -> Option<i32> {
        match format {
            RosterFormat::OneQb => self.one_qb_position_rank,
            RosterFormat::Superflex => self.superflex_position_rank,
        }
    }
}

/// Value resolved for a single lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValuationMatch {
    pub value: i64,
    pub position_rank: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RosterSlot {
    Starter,
    Bench,
}

/// A player on a manager's roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub manager_id: ManagerId,
    pub player_id: String,
    pub slot: RosterSlot,
}

impl RosterEntry {
    pub fn new(manager_id: impl Into<ManagerId>, player_id: impl Into<String>, slot: RosterSlot) -> Self {
        Self { manager_id: manager_id.into(), player_id: player_id.into(), slot }
    }
}

/// Per-manager totals for one league
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerAggregate {
    pub manager_id: ManagerId,
    pub league_id: String,
    pub total_value: i64,
    pub starters_value: i64,
    pub bench_value: i64,
    pub picks_value: i64,
    pub picks_count: usize,
    pub players_count: usize,
    pub unmatched_picks: usize,
    pub unmatched_players: usize,
}

impl ManagerAggregate {
    pub fn new(manager_id: impl Into<ManagerId>, league_id: impl Into<String>) -> Self {
        Self { manager_id: manager_id.into(), league_id: league_id.into(), ..Default::default() }
    }

    pub fn metric(&self, metric: Metric) -> i64 {
        match metric {
            Metric::Power => self.total_value,
            Metric::Starters => self.starters_value,
            Metric::Bench => self.bench_value,
            Metric::Picks => self.picks_value,
        }
    }
}

/// Ranked dimension of a manager aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Total roster value
    Power,
    Starters,
    Bench,
    Picks,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Power, Metric::Starters, Metric::Bench, Metric::Picks];
}

/// Valuation provider a rank set is written for.
///
/// Rank-summary column names are derived from this enum only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankSource {
    Ktc,
    Fc,
    Dp,
    Dd,
    #[default]
    Sf,
}

impl RankSource {
    pub const ALL: [RankSource; 5] =
        [RankSource::Ktc, RankSource::Fc, RankSource::Dp, RankSource::Dd, RankSource::Sf];

    pub fn as_str(&self) -> &'static str {
        match self {
            RankSource::Ktc => "ktc",
            RankSource::Fc => "fc",
            RankSource::Dp => "dp",
            RankSource::Dd => "dd",
            RankSource::Sf => "sf",
        }
    }

    /// Rank-summary columns owned by this source, in `Metric::ALL` order
    pub fn rank_columns(&self) -> [&'static str; 4] {
        match self {
            RankSource::Ktc => ["ktc_power_rank", "ktc_starters_rank", "ktc_bench_rank", "ktc_picks_rank"],
            RankSource::Fc => ["fc_power_rank", "fc_starters_rank", "fc_bench_rank", "fc_picks_rank"],
            RankSource::Dp => ["dp_power_rank", "dp_starters_rank", "dp_bench_rank", "dp_picks_rank"],
            RankSource::Dd => ["dd_power_rank", "dd_starters_rank", "dd_bench_rank", "dd_picks_rank"],
            RankSource::Sf => ["sf_power_rank", "sf_starters_rank", "sf_bench_rank", "sf_picks_rank"],
        }
    }
}

impl fmt::Display for RankSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankSource {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        RankSource::ALL
            .into_iter()
            .find(|source| source.as_str() == normalized)
            .ok_or_else(|| ValuationError::UnknownRankSource(s.to_string()))
    }
}

/// Competition ranks of one manager across all metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RankSet {
    pub power: u32,
    pub starters: u32,
    pub bench: u32,
    pub picks: u32,
}

impl RankSet {
    pub fn get(&self, metric: Metric) -> u32 {
        match metric {
            Metric::Power => self.power,
            Metric::Starters => self.starters,
            Metric::Bench => self.bench,
            Metric::Picks => self.picks,
        }
    }

    pub fn set(&mut self, metric: Metric, rank: u32) {
        match metric {
            Metric::Power => self.power = rank,
            Metric::Starters => self.starters = rank,
            Metric::Bench => self.bench = rank,
            Metric::Picks => self.picks = rank,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerRanks {
    pub manager_id: ManagerId,
    pub league_id: String,
    pub ranks: RankSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_type_parse() {
        assert_eq!("dynasty".parse::<RankType>().unwrap(), RankType::Dynasty);
        assert_eq!("Dynasty".parse::<RankType>().unwrap(), RankType::Dynasty);
        assert_eq!("redraft".parse::<RankType>().unwrap(), RankType::Redraft);
        assert_eq!("anything".parse::<RankType>().unwrap(), RankType::Redraft);
    }

    #[test]
    fn test_roster_format_parse() {
        assert_eq!("Superflex".parse::<RosterFormat>().unwrap(), RosterFormat::Superflex);
        assert_eq!("one_qb".parse::<RosterFormat>().unwrap(), RosterFormat::OneQb);
        assert_eq!("1QB".parse::<RosterFormat>().unwrap(), RosterFormat::OneQb);
        assert!("two_qb".parse::<RosterFormat>().is_err());
    }

    #[test]
    fn test_rank_source_closed_set() {
        assert_eq!("KTC".parse::<RankSource>().unwrap(), RankSource::Ktc);
        assert!("ktc; DROP TABLE".parse::<RankSource>().is_err());
        for source in RankSource::ALL {
            for column in source.rank_columns() {
                assert!(column.starts_with(source.as_str()));
            }
        }
    }

    #[test]
    fn test_value_for_format() {
        let entry = ValuationEntry {
            name: "2026 Mid 1st".to_string(),
            player_id: None,
            rank_type: RankType::Dynasty,
            one_qb_value: 3000,
            superflex_value: 4000,
            one_qb_position_rank: None,
            superflex_position_rank: Some(12),
        };
        assert_eq!(entry.value_for(RosterFormat::OneQb), 3000);
        assert_eq!(entry.value_for(RosterFormat::Superflex), 4000);
        assert_eq!(entry.position_rank_for(RosterFormat::Superflex), Some(12));
    }
}
