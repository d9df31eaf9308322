//! Canonical pick naming
//!
//! A canonical name is the key a pick's market value is looked up under,
//! e.g. "2026 Mid 2nd". Picks in the same season, round and tier share a
//! name on purpose: the market does not price two mid 2nds differently.

use crate::types::{DraftOrder, RoundTier};
use serde::{Deserialize, Serialize};

/// How picks are assigned to a round tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierPolicy {
    /// Every pick is "Mid" (draft order unknown)
    #[default]
    AlwaysMid,
    /// Use the original owner's draft slot for the season the order is known for
    Positional,
}

/// English ordinal for a round number: 1st, 2nd, 3rd, 4th, 11th, 21st, ...
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

pub fn canonical_name(season: i32, round: u32, tier: RoundTier) -> String {
    format!("{} {} {}", season, tier, ordinal(round))
}

/// Assigns tiers to picks under a policy
#[derive(Debug, Clone, Default)]
pub struct CanonicalNamer {
    policy: TierPolicy,
    draft_order: Option<DraftOrder>,
}

impl CanonicalNamer {
    pub fn always_mid() -> Self {
        Self::default()
    }

    /// Positional tiers for the season covered by `draft_order`
    pub fn positional(draft_order: DraftOrder) -> Self {
        Self { policy: TierPolicy::Positional, draft_order: Some(draft_order) }
    }

    /// Build a namer from a configured policy; without a draft order the
    /// positional policy degrades to always-mid.
    pub fn from_policy(policy: TierPolicy, draft_order: Option<DraftOrder>) -> Self {
        match (policy, draft_order) {
            (TierPolicy::Positional, Some(order)) => Self::positional(order),
            _ => Self::always_mid(),
        }
    }

    pub fn policy(&self) -> TierPolicy {
        self.policy
    }

    pub fn tier_for(&self, season: i32, original_owner_id: &str) -> RoundTier {
        if self.policy == TierPolicy::AlwaysMid {
            return RoundTier::Mid;
        }

        self.draft_order
            .as_ref()
            .filter(|order| order.season == season)
            .and_then(|order| order.slot_for(original_owner_id))
            .map(RoundTier::from_draft_slot)
            .unwrap_or(RoundTier::Mid)
    }

    pub fn name_for(&self, season: i32, round: u32, original_owner_id: &str) -> String {
        canonical_name(season, round, self.tier_for(season, original_owner_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_suffixes() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(10), "10th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(13), "13th");
        assert_eq!(ordinal(21), "21st");
        assert_eq!(ordinal(22), "22nd");
        assert_eq!(ordinal(23), "23rd");
        assert_eq!(ordinal(111), "111th");
        assert_eq!(ordinal(112), "112th");
        assert_eq!(ordinal(101), "101st");
    }

    #[test]
    fn test_canonical_name_determinism() {
        assert_eq!(
            canonical_name(2026, 2, RoundTier::Mid),
            canonical_name(2026, 2, RoundTier::Mid)
        );
        assert_eq!(canonical_name(2026, 2, RoundTier::Mid), "2026 Mid 2nd");
        assert_ne!(
            canonical_name(2026, 2, RoundTier::Mid),
            canonical_name(2026, 3, RoundTier::Mid)
        );
        assert_ne!(
            canonical_name(2026, 1, RoundTier::Early),
            canonical_name(2026, 1, RoundTier::Late)
        );
        assert_ne!(
            canonical_name(2026, 1, RoundTier::Mid),
            canonical_name(2027, 1, RoundTier::Mid)
        );
    }

    #[test]
    fn test_always_mid_ignores_slots() {
        let namer = CanonicalNamer::from_policy(TierPolicy::AlwaysMid, None);
        assert_eq!(namer.tier_for(2026, "A"), RoundTier::Mid);
        assert_eq!(namer.name_for(2026, 2, "A"), "2026 Mid 2nd");
    }

    #[test]
    fn test_positional_uses_original_owner_slot() {
        let order = DraftOrder::new(2026).with_slot("A", 2).with_slot("B", 6).with_slot("C", 11);
        let namer = CanonicalNamer::from_policy(TierPolicy::Positional, Some(order));

        assert_eq!(namer.policy(), TierPolicy::Positional);
        assert_eq!(namer.name_for(2026, 1, "A"), "2026 Early 1st");
        assert_eq!(namer.name_for(2026, 1, "B"), "2026 Mid 1st");
        assert_eq!(namer.name_for(2026, 1, "C"), "2026 Late 1st");
        // unknown manager and other seasons fall back to mid
        assert_eq!(namer.name_for(2026, 1, "Z"), "2026 Mid 1st");
        assert_eq!(namer.name_for(2027, 1, "A"), "2027 Mid 1st");
    }

    #[test]
    fn test_positional_without_order_degrades() {
        let namer = CanonicalNamer::from_policy(TierPolicy::Positional, None);
        assert_eq!(namer.policy(), TierPolicy::AlwaysMid);
    }
}
