//! Ownership resolution
//!
//! Platforms report pick ownership from every team's perspective, so the same
//! traded pick can show up once from the sender and once from the receiver,
//! or as a chain of hops. The resolver collapses all of it to exactly one
//! record per original pick, carrying the final owner.

use crate::naming::CanonicalNamer;
use crate::types::{DraftPickRecord, ManagerId, OwnershipFact, PickKey};
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Default round ceiling; later rounds carry no market value
pub const DEFAULT_MAX_ROUND: u32 = 4;

/// Resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Facts for rounds above this are dropped
    pub max_round: u32,

    /// Seasons to synthesize untraded picks for when a platform reports
    /// no pick data of its own (empty disables synthesis)
    pub base_pick_seasons: Vec<i32>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { max_round: DEFAULT_MAX_ROUND, base_pick_seasons: Vec::new() }
    }
}

/// Result of one resolution pass
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// One record per original pick, ordered by `(season, round, original_owner_id)`
    pub records: Vec<DraftPickRecord>,
    /// Facts outside the round bounds or missing an original owner
    pub dropped_facts: usize,
    /// Facts for a pick that named a different owner than the winning fact
    pub conflicting_facts: usize,
    /// Records that fell back to the original owner
    pub unresolved: usize,
    /// Untraded records created by base-pick synthesis
    pub synthesized: usize,
}

/// Collapses raw ownership facts into ledger records
#[derive(Debug, Clone, Default)]
pub struct OwnershipResolver {
    config: ResolverConfig,
    namer: CanonicalNamer,
}

impl OwnershipResolver {
    pub fn new(config: ResolverConfig, namer: CanonicalNamer) -> Self {
        Self { config, namer }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve facts for one league snapshot.
    ///
    /// `managers` is the league's known manager list; when it is non-empty an
    /// owner outside it counts as unresolvable.
    pub fn resolve(
        &self,
        league_id: &str,
        snapshot_id: &str,
        facts: &[OwnershipFact],
        managers: &[ManagerId],
    ) -> Resolution {
        let mut resolution = Resolution::default();
        let mut candidates: BTreeMap<PickKey, Vec<&OwnershipFact>> = BTreeMap::new();

        for fact in facts {
            if !self.in_bounds(fact) {
                debug!(
                    league_id,
                    season = fact.season,
                    round = fact.round,
                    original_owner = %fact.original_owner_id,
                    "Dropping ownership fact outside pick bounds"
                );
                resolution.dropped_facts += 1;
                continue;
            }
            candidates.entry(fact.key()).or_default().push(fact);
        }

        let known: HashSet<&str> = managers.iter().map(String::as_str).collect();
        let mut resolved: BTreeMap<PickKey, DraftPickRecord> = BTreeMap::new();

        for (key, facts) in candidates {
            let Some(winner) = facts.iter().copied().max_by_key(|fact| authority(*fact, &known)) else {
                continue;
            };
            resolution.conflicting_facts +=
                facts.iter().filter(|fact| fact.current_owner_id != winner.current_owner_id).count();

            let record = self.build_record(league_id, snapshot_id, key.clone(), winner, &known);
            if record.unresolved {
                resolution.unresolved += 1;
            }
            resolved.insert(key, record);
        }

        for key in self.base_pick_keys(managers) {
            if resolved.contains_key(&key) {
                continue;
            }
            let tier = self.namer.tier_for(key.season, &key.original_owner_id);
            let owner = key.original_owner_id.clone();
            resolved.insert(key.clone(), DraftPickRecord::new(league_id, snapshot_id, key, owner, tier));
            resolution.synthesized += 1;
        }

        resolution.records = resolved.into_values().collect();

        info!(
            league_id,
            snapshot_id,
            records = resolution.records.len(),
            dropped = resolution.dropped_facts,
            conflicts = resolution.conflicting_facts,
            unresolved = resolution.unresolved,
            synthesized = resolution.synthesized,
            "Resolved draft pick ownership"
        );

        resolution
    }

    fn in_bounds(&self, fact: &OwnershipFact) -> bool {
        fact.round >= 1
            && fact.round <= self.config.max_round
            && !fact.original_owner_id.trim().is_empty()
    }

    fn build_record(
        &self,
        league_id: &str,
        snapshot_id: &str,
        key: PickKey,
        fact: &OwnershipFact,
        known: &HashSet<&str>,
    ) -> DraftPickRecord {
        let tier = self.namer.tier_for(key.season, &key.original_owner_id);

        match resolvable_owner(fact, known) {
            Some(owner) => DraftPickRecord::new(league_id, snapshot_id, key, owner, tier),
            None => {
                warn!(
                    league_id,
                    season = key.season,
                    round = key.round,
                    original_owner = %key.original_owner_id,
                    reported_owner = ?fact.current_owner_id,
                    "Could not resolve current owner, keeping original owner"
                );
                let original = key.original_owner_id.clone();
                DraftPickRecord::new(league_id, snapshot_id, key, original, tier).flagged_unresolved()
            }
        }
    }

    fn base_pick_keys(&self, managers: &[ManagerId]) -> Vec<PickKey> {
        let mut keys = Vec::new();
        for season in &self.config.base_pick_seasons {
            for manager in managers {
                for round in 1..=self.config.max_round {
                    keys.push(PickKey {
                        season: *season,
                        round,
                        original_owner_id: manager.clone(),
                    });
                }
            }
        }
        keys
    }
}

/// The fact's owner, when it names a league manager
fn resolvable_owner<'a>(fact: &'a OwnershipFact, known: &HashSet<&str>) -> Option<&'a str> {
    fact.current_owner_id
        .as_deref()
        .map(str::trim)
        .filter(|owner| !owner.is_empty())
        .filter(|owner| known.is_empty() || known.contains(owner))
}

type Authority<'a> =
    (bool, Option<DateTime<Utc>>, Option<u64>, bool, Reverse<Option<&'a str>>, Reverse<Option<&'a str>>);

/// Sort key for competing facts on one pick; the greatest key wins.
///
/// A resolvable owner beats an unresolvable one. Then the later timestamp,
/// then the later sequence (dated beats undated), then the owning team's own
/// report. Remaining ties go to the lowest owner id so the winner never
/// depends on the order facts arrive in.
fn authority<'a>(fact: &'a OwnershipFact, known: &HashSet<&str>) -> Authority<'a> {
    (
        resolvable_owner(fact, known).is_some(),
        fact.observed_at,
        fact.sequence,
        fact.is_self_reported(),
        Reverse(fact.current_owner_id.as_deref()),
        Reverse(fact.reported_by.as_deref()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DraftOrder, RoundTier};
    use chrono::TimeZone;

    fn managers(ids: &[&str]) -> Vec<ManagerId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn resolver() -> OwnershipResolver {
        OwnershipResolver::new(ResolverConfig::default(), CanonicalNamer::always_mid())
    }

    #[test]
    fn test_trade_chain_collapses_to_final_owner() {
        let facts = vec![
            OwnershipFact::new(2026, 1, "A", "B").sequence(1),
            OwnershipFact::new(2026, 1, "A", "C").sequence(2),
        ];

        let resolution = resolver().resolve("L", "S", &facts, &managers(&["A", "B", "C"]));

        assert_eq!(resolution.records.len(), 1);
        let record = &resolution.records[0];
        assert_eq!(record.original_owner_id, "A");
        assert_eq!(record.current_owner_id, "C");
        assert!(!record.unresolved);
        assert_eq!(resolution.conflicting_facts, 1);
    }

    #[test]
    fn test_trade_chain_order_independent_when_dated() {
        let early = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let facts = vec![
            OwnershipFact::new(2026, 1, "A", "C").observed_at(late),
            OwnershipFact::new(2026, 1, "A", "B").observed_at(early),
        ];

        let resolution = resolver().resolve("L", "S", &facts, &[]);
        assert_eq!(resolution.records.len(), 1);
        assert_eq!(resolution.records[0].current_owner_id, "C");
    }

    #[test]
    fn test_dated_fact_beats_undated() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let facts = vec![
            OwnershipFact::new(2026, 2, "A", "B").observed_at(at),
            OwnershipFact::new(2026, 2, "A", "D").reported_by("D"),
        ];

        let resolution = resolver().resolve("L", "S", &facts, &[]);
        assert_eq!(resolution.records[0].current_owner_id, "B");
    }

    #[test]
    fn test_owner_report_beats_third_party() {
        // Stale view from another team first, receiver's own record second
        let facts = vec![
            OwnershipFact::new(2026, 2, "T1", "T1").reported_by("X"),
            OwnershipFact::new(2026, 2, "T1", "M").reported_by("M"),
        ];

        let resolution = resolver().resolve("L", "S", &facts, &managers(&["T1", "M", "X"]));
        assert_eq!(resolution.records.len(), 1);
        assert_eq!(resolution.records[0].current_owner_id, "M");
    }

    #[test]
    fn test_same_trade_from_both_sides_is_one_record() {
        let facts = vec![
            OwnershipFact::new(2026, 2, "T1", "M").reported_by("T1"),
            OwnershipFact::new(2026, 2, "T1", "M").reported_by("M"),
        ];

        let resolution = resolver().resolve("L", "S", &facts, &[]);
        assert_eq!(resolution.records.len(), 1);
        assert_eq!(resolution.conflicting_facts, 0);
        assert_eq!(resolution.records[0].current_owner_id, "M");
    }

    #[test]
    fn test_untraded_pick_is_first_class() {
        let facts = vec![OwnershipFact::new(2026, 3, "A", "A")];
        let resolution = resolver().resolve("L", "S", &facts, &managers(&["A"]));

        let record = &resolution.records[0];
        assert_eq!(record.current_owner_id, "A");
        assert!(!record.is_traded());
        assert!(!record.unresolved);
        assert_eq!(record.canonical_name(), "2026 Mid 3rd");
    }

    #[test]
    fn test_out_of_bounds_rounds_dropped() {
        let facts = vec![
            OwnershipFact::new(2026, 0, "A", "A"),
            OwnershipFact::new(2026, 5, "A", "A"),
            OwnershipFact::new(2026, 4, "A", "A"),
            OwnershipFact::new(2026, 1, " ", "A"),
        ];

        let resolution = resolver().resolve("L", "S", &facts, &[]);
        assert_eq!(resolution.records.len(), 1);
        assert_eq!(resolution.records[0].round, 4);
        assert_eq!(resolution.dropped_facts, 3);
    }

    #[test]
    fn test_unresolved_owner_falls_back_to_original() {
        let mut missing = OwnershipFact::new(2026, 1, "A", "A");
        missing.current_owner_id = None;
        let facts = vec![missing, OwnershipFact::new(2026, 2, "A", "GHOST")];

        let resolution = resolver().resolve("L", "S", &facts, &managers(&["A", "B"]));

        assert_eq!(resolution.records.len(), 2);
        assert_eq!(resolution.unresolved, 2);
        for record in &resolution.records {
            assert_eq!(record.current_owner_id, "A");
            assert!(record.unresolved);
        }
    }

    #[test]
    fn test_base_pick_synthesis_fills_gaps() {
        let config = ResolverConfig { max_round: 2, base_pick_seasons: vec![2026] };
        let resolver = OwnershipResolver::new(config, CanonicalNamer::always_mid());
        let facts = vec![OwnershipFact::new(2026, 1, "A", "B")];

        let resolution = resolver.resolve("L", "S", &facts, &managers(&["A", "B"]));

        // A1 (traded to B), A2, B1, B2
        assert_eq!(resolution.records.len(), 4);
        assert_eq!(resolution.synthesized, 3);
        let traded: Vec<_> = resolution.records.iter().filter(|r| r.is_traded()).collect();
        assert_eq!(traded.len(), 1);
        assert_eq!(traded[0].current_owner_id, "B");
    }

    #[test]
    fn test_positional_tiers_applied() {
        let order = DraftOrder::new(2026).with_slot("A", 1).with_slot("B", 10);
        let resolver =
            OwnershipResolver::new(ResolverConfig::default(), CanonicalNamer::positional(order));
        let facts = vec![
            OwnershipFact::new(2026, 1, "A", "B"),
            OwnershipFact::new(2026, 1, "B", "B"),
        ];

        let resolution = resolver.resolve("L", "S", &facts, &[]);
        assert_eq!(resolution.records[0].round_tier(), RoundTier::Early);
        assert_eq!(resolution.records[1].round_tier(), RoundTier::Late);
        assert_eq!(resolution.records[1].canonical_name(), "2026 Late 1st");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let facts = vec![
            OwnershipFact::new(2027, 1, "B", "A"),
            OwnershipFact::new(2026, 2, "A", "B"),
            OwnershipFact::new(2026, 1, "C", "C"),
        ];
        let first = resolver().resolve("L", "S", &facts, &[]);
        let second = resolver().resolve("L", "S", &facts, &[]);

        assert_eq!(first.records, second.records);
        let keys: Vec<_> = first.records.iter().map(|r| (r.season, r.round)).collect();
        assert_eq!(keys, vec![(2026, 1), (2026, 2), (2027, 1)]);
    }

    #[test]
    fn test_missing_owner_does_not_hide_known_owner() {
        let mut missing = OwnershipFact::new(2026, 1, "A", "A");
        missing.current_owner_id = None;
        let facts = vec![missing, OwnershipFact::new(2026, 1, "A", "B")];

        let resolution = resolver().resolve("L", "S", &facts, &managers(&["A", "B"]));
        assert_eq!(resolution.records[0].current_owner_id, "B");
        assert!(!resolution.records[0].unresolved);
        assert_eq!(resolution.unresolved, 0);
    }

    #[test]
    fn test_later_unknown_owner_does_not_hide_known_owner() {
        let facts = vec![
            OwnershipFact::new(2026, 1, "A", "B").sequence(1),
            OwnershipFact::new(2026, 1, "A", "GHOST").sequence(2),
        ];

        let resolution = resolver().resolve("L", "S", &facts, &managers(&["A", "B"]));
        assert_eq!(resolution.records[0].current_owner_id, "B");
        assert!(!resolution.records[0].unresolved);
    }

    #[test]
    fn test_resolution_ignores_fact_order() {
        let mut missing = OwnershipFact::new(2026, 1, "A", "A");
        missing.current_owner_id = None;
        let facts = vec![
            missing,
            OwnershipFact::new(2026, 1, "A", "B"),
            OwnershipFact::new(2026, 1, "A", "C"),
            OwnershipFact::new(2026, 1, "A", "GHOST").sequence(4),
            OwnershipFact::new(2026, 2, "B", "A").reported_by("C"),
            OwnershipFact::new(2026, 2, "B", "C").reported_by("A"),
        ];
        let league = managers(&["A", "B", "C"]);
        let expected = resolver().resolve("L", "S", &facts, &league);

        // every rotation and the reversal
        let mut orders: Vec<Vec<OwnershipFact>> = (0..facts.len())
            .map(|n| {
                let mut rotated = facts.clone();
                rotated.rotate_left(n);
                rotated
            })
            .collect();
        orders.push(facts.iter().rev().cloned().collect());

        for order in orders {
            let resolution = resolver().resolve("L", "S", &order, &league);
            assert_eq!(resolution.records, expected.records);
            assert_eq!(resolution.conflicting_facts, expected.conflicting_facts);
            assert_eq!(resolution.unresolved, 0);
        }
        assert_eq!(expected.records[0].current_owner_id, "B");
    }
}
