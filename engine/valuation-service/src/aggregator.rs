//! Per-manager value aggregation
//!
//! Picks and players are matched against the valuation table separately and
//! only meet in the final total. Each ledger row is its own addend, so two
//! picks that share a canonical name count twice.

use crate::table::ValuationLookup;
use crate::types::{ManagerAggregate, RosterEntry, RosterSlot};
use pick_ledger::{DraftPickRecord, ManagerId};
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::debug;

/// Aggregates for one league plus league-wide match counts
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregationOutcome {
    /// One entry per manager, ordered by manager id
    pub aggregates: Vec<ManagerAggregate>,
    pub unmatched_picks: usize,
    pub unmatched_players: usize,
    /// Roster rows dropped because the player was already on that roster
    pub duplicate_roster_rows: usize,
}

impl AggregationOutcome {
    pub fn get(&self, manager_id: &str) -> Option<&ManagerAggregate> {
        self.aggregates.iter().find(|a| a.manager_id == manager_id)
    }
}

/// Stateless aggregation over a single valuation table
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuationAggregator;

impl ValuationAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(
        &self,
        league_id: &str,
        managers: &[ManagerId],
        picks: &[DraftPickRecord],
        roster: &[RosterEntry],
        lookup: &dyn ValuationLookup,
    ) -> AggregationOutcome {
        let mut outcome = AggregationOutcome::default();
        let mut totals: BTreeMap<ManagerId, ManagerAggregate> = managers
            .iter()
            .map(|id| (id.clone(), ManagerAggregate::new(id.clone(), league_id)))
            .collect();

        for pick in picks {
            let aggregate = totals
                .entry(pick.current_owner_id.clone())
                .or_insert_with(|| ManagerAggregate::new(pick.current_owner_id.clone(), league_id));
            aggregate.picks_count += 1;

            match lookup.pick_value(pick.canonical_name()) {
                Some(found) => aggregate.picks_value += found.value,
                None => {
                    debug!("No valuation for pick {} in league {}", pick.canonical_name(), league_id);
                    aggregate.unmatched_picks += 1;
                    outcome.unmatched_picks += 1;
                }
            }
        }

        let (players, duplicates) = dedup_roster(roster);
        outcome.duplicate_roster_rows = duplicates;

        for ((manager_id, player_id), slot) in players {
            let aggregate = totals
                .entry(manager_id.to_string())
                .or_insert_with(|| ManagerAggregate::new(manager_id, league_id));
            aggregate.players_count += 1;

            let value = match lookup.player_value(player_id) {
                Some(found) => found.value,
                None => {
                    debug!("No valuation for player {} in league {}", player_id, league_id);
                    aggregate.unmatched_players += 1;
                    outcome.unmatched_players += 1;
                    0
                }
            };
            match slot {
                RosterSlot::Starter => aggregate.starters_value += value,
                RosterSlot::Bench => aggregate.bench_value += value,
            }
        }

        outcome.aggregates = totals
            .into_values()
            .map(|mut aggregate| {
                aggregate.total_value =
                    aggregate.starters_value + aggregate.bench_value + aggregate.picks_value;
                aggregate
            })
            .collect();

        outcome
    }
}

/// One row per `(manager, player)`; a starter row wins over a bench row
fn dedup_roster(roster: &[RosterEntry]) -> (BTreeMap<(&str, &str), RosterSlot>, usize) {
    let mut players = BTreeMap::new();
    let mut duplicates = 0;

    for entry in roster {
        match players.entry((entry.manager_id.as_str(), entry.player_id.as_str())) {
            Entry::Vacant(vacant) => {
                vacant.insert(entry.slot);
            }
            Entry::Occupied(mut occupied) => {
                duplicates += 1;
                if entry.slot == RosterSlot::Starter {
                    occupied.insert(RosterSlot::Starter);
                }
            }
        }
    }

    (players, duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ValuationTable;
    use crate::types::{RankType, RosterFormat, ValuationEntry};
    use pick_ledger::{PickKey, RoundTier};

    fn entry(name: &str, player_id: Option<&str>, value: i64) -> ValuationEntry {
        ValuationEntry {
            name: name.to_string(),
            player_id: player_id.map(str::to_string),
            rank_type: RankType::Dynasty,
            one_qb_value: value,
            superflex_value: value,
            one_qb_position_rank: None,
            superflex_position_rank: None,
        }
    }

    fn pick(season: i32, round: u32, original: &str, current: &str) -> DraftPickRecord {
        let key = PickKey { season, round, original_owner_id: original.to_string() };
        DraftPickRecord::new("L", "S", key, current, RoundTier::Mid)
    }

    fn managers(ids: &[&str]) -> Vec<ManagerId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn table(entries: &[ValuationEntry]) -> ValuationTable {
        ValuationTable::build(RankType::Dynasty, RosterFormat::Superflex, entries)
    }

    #[test]
    fn test_same_name_picks_are_separate_addends() {
        // Own 2026 2nd plus one acquired from T1, valued at 5,000 each
        let values = table(&[entry("2026 Mid 2nd", None, 5000)]);
        let picks = vec![pick(2026, 2, "M", "M"), pick(2026, 2, "T1", "M")];

        let outcome = ValuationAggregator::new().aggregate(
            "L",
            &managers(&["M", "T1"]),
            &picks,
            &[],
            &values,
        );

        let m = outcome.get("M").unwrap();
        assert_eq!(m.picks_count, 2);
        assert_eq!(m.picks_value, 10_000);
        assert_eq!(m.total_value, 10_000);
        assert_eq!(outcome.get("T1").unwrap().picks_value, 0);
    }

    #[test]
    fn test_duplicate_valuation_rows_do_not_fan_out() {
        let values = table(&[entry("2026 Mid 2nd", None, 5000), entry("2026 Mid 2nd", None, 5000)]);
        let picks = vec![pick(2026, 2, "M", "M"), pick(2026, 2, "T1", "M")];

        let outcome = ValuationAggregator::new().aggregate("L", &managers(&["M"]), &picks, &[], &values);
        let m = outcome.get("M").unwrap();
        assert_eq!(m.picks_count, 2);
        assert_eq!(m.picks_value, 10_000);
    }

    #[test]
    fn test_missing_values_zero_filled() {
        let values = table(&[]);
        let picks = vec![pick(2031, 1, "A", "A")];
        let roster = vec![RosterEntry::new("A", "p-unknown", RosterSlot::Starter)];

        let outcome = ValuationAggregator::new().aggregate("L", &managers(&["A"]), &picks, &roster, &values);
        let a = outcome.get("A").unwrap();
        assert_eq!(a.total_value, 0);
        assert_eq!(a.picks_count, 1);
        assert_eq!(a.players_count, 1);
        assert_eq!(outcome.unmatched_picks, 1);
        assert_eq!(outcome.unmatched_players, 1);
    }

    #[test]
    fn test_every_manager_present() {
        let values = table(&[]);
        let outcome =
            ValuationAggregator::new().aggregate("L", &managers(&["C", "A", "B"]), &[], &[], &values);

        let ids: Vec<_> = outcome.aggregates.iter().map(|a| a.manager_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert!(outcome.aggregates.iter().all(|a| a.total_value == 0 && a.league_id == "L"));
    }

    #[test]
    fn test_starters_bench_and_total() {
        let values = table(&[
            entry("QB One", Some("p1"), 8000),
            entry("RB Two", Some("p2"), 3000),
            entry("2026 Mid 1st", None, 4000),
        ]);
        let roster = vec![
            RosterEntry::new("A", "p1", RosterSlot::Starter),
            RosterEntry::new("A", "p2", RosterSlot::Bench),
            // same player reported twice; starter wins
            RosterEntry::new("A", "p2", RosterSlot::Starter),
        ];
        let picks = vec![pick(2026, 1, "A", "A")];

        let outcome = ValuationAggregator::new().aggregate("L", &managers(&["A"]), &picks, &roster, &values);
        let a = outcome.get("A").unwrap();
        assert_eq!(a.starters_value, 11_000);
        assert_eq!(a.bench_value, 0);
        assert_eq!(a.picks_value, 4000);
        assert_eq!(a.total_value, 15_000);
        assert_eq!(a.players_count, 2);
        assert_eq!(outcome.duplicate_roster_rows, 1);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let values = table(&[entry("2026 Mid 2nd", None, 5000)]);
        let picks = vec![pick(2026, 2, "M", "M")];
        let aggregator = ValuationAggregator::new();

        let first = aggregator.aggregate("L", &managers(&["M"]), &picks, &[], &values);
        let second = aggregator.aggregate("L", &managers(&["M"]), &picks, &[], &values);
        assert_eq!(first.aggregates, second.aggregates);
    }
}
