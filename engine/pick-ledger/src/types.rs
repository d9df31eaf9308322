//! Type definitions for draft pick identity and ownership

use crate::error::LedgerError;
use crate::naming::canonical_name;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Manager identifier as reported by the league platform
pub type ManagerId = String;

/// Coarse position of a pick within its round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoundTier {
    Early,
    Mid,
    Late,
}

impl RoundTier {
    /// Map a 1-based draft slot to a tier (slots 1-4 early, 5-8 mid, 9+ late)
    pub fn from_draft_slot(slot: u32) -> Self {
        if slot < 5 {
            RoundTier::Early
        } else if slot < 9 {
            RoundTier::Mid
        } else {
            RoundTier::Late
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundTier::Early => "Early",
            RoundTier::Mid => "Mid",
            RoundTier::Late => "Late",
        }
    }
}

impl fmt::Display for RoundTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundTier {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "early" => Ok(RoundTier::Early),
            "mid" => Ok(RoundTier::Mid),
            "late" => Ok(RoundTier::Late),
            other => Err(LedgerError::InvalidTier(other.to_string())),
        }
    }
}

/// Identity of a pick inside one league snapshot.
///
/// Ordering is `(season, round, original_owner_id)`, which is also the order
/// the ledger returns rows in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickKey {
    pub season: i32,
    pub round: u32,
    pub original_owner_id: ManagerId,
}

/// One future draft pick as held in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftPickRecord {
    pub league_id: String,
    pub snapshot_id: String,
    pub season: i32,
    pub round: u32,
    pub original_owner_id: ManagerId,
    pub current_owner_id: ManagerId,
    /// Set when the current owner could not be resolved and the original owner was kept
    pub unresolved: bool,
    round_tier: RoundTier,
    canonical_name: String,
}

impl DraftPickRecord {
    pub fn new(
        league_id: impl Into<String>,
        snapshot_id: impl Into<String>,
        key: PickKey,
        current_owner_id: impl Into<ManagerId>,
        round_tier: RoundTier,
    ) -> Self {
        let canonical_name = canonical_name(key.season, key.round, round_tier);
        Self {
            league_id: league_id.into(),
            snapshot_id: snapshot_id.into(),
            season: key.season,
            round: key.round,
            original_owner_id: key.original_owner_id,
            current_owner_id: current_owner_id.into(),
            unresolved: false,
            round_tier,
            canonical_name,
        }
    }

    /// Mark the record as carrying a fallback owner
    pub fn flagged_unresolved(mut self) -> Self {
        self.unresolved = true;
        self
    }

    pub fn round_tier(&self) -> RoundTier {
        self.round_tier
    }

    /// Change the tier; the canonical name follows it
    pub fn set_round_tier(&mut self, tier: RoundTier) {
        self.round_tier = tier;
        self.canonical_name = canonical_name(self.season, self.round, tier);
    }

    /// Valuation lookup key, e.g. "2026 Mid 2nd"
    pub fn canonical_name(&self) -> &str {
        &self.canonical_name
    }

    pub fn key(&self) -> PickKey {
        PickKey {
            season: self.season,
            round: self.round,
            original_owner_id: self.original_owner_id.clone(),
        }
    }

    pub fn is_traded(&self) -> bool {
        self.current_owner_id != self.original_owner_id
    }
}

/// A raw ownership fact as reported by a platform for one pick.
///
/// The platform has already folded trades in, so `current_owner_id` is the
/// owner as that team's record saw it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipFact {
    pub season: i32,
    pub round: u32,
    pub original_owner_id: ManagerId,

    #[serde(default, alias = "owned_by")]
    pub current_owner_id: Option<ManagerId>,

    /// Team whose record produced this fact
    #[serde(default)]
    pub reported_by: Option<ManagerId>,

    #[serde(default)]
    pub observed_at: Option<DateTime<Utc>>,

    /// Transaction order for platforms that report trade hops without timestamps
    #[serde(default)]
    pub sequence: Option<u64>,
}

impl OwnershipFact {
    pub fn new(
        season: i32,
        round: u32,
        original_owner_id: impl Into<ManagerId>,
        current_owner_id: impl Into<ManagerId>,
    ) -> Self {
        Self {
            season,
            round,
            original_owner_id: original_owner_id.into(),
            current_owner_id: Some(current_owner_id.into()),
            reported_by: None,
            observed_at: None,
            sequence: None,
        }
    }

    pub fn reported_by(mut self, team: impl Into<ManagerId>) -> Self {
        self.reported_by = Some(team.into());
        self
    }

    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = Some(at);
        self
    }

    pub fn sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn key(&self) -> PickKey {
        PickKey {
            season: self.season,
            round: self.round,
            original_owner_id: self.original_owner_id.clone(),
        }
    }

    /// True when the owning team itself reported the fact
    pub fn is_self_reported(&self) -> bool {
        match (&self.reported_by, &self.current_owner_id) {
            (Some(reporter), Some(owner)) => reporter == owner,
            _ => false,
        }
    }

    pub fn is_dated(&self) -> bool {
        self.observed_at.is_some() || self.sequence.is_some()
    }
}

/// Draft slots for one season, keyed by the manager whose pick sits in that slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOrder {
    pub season: i32,
    pub slots: HashMap<ManagerId, u32>,
}

impl DraftOrder {
    pub fn new(season: i32) -> Self {
        Self { season, slots: HashMap::new() }
    }

    pub fn with_slot(mut self, manager_id: impl Into<ManagerId>, slot: u32) -> Self {
        self.slots.insert(manager_id.into(), slot);
        self
    }

    pub fn slot_for(&self, manager_id: &str) -> Option<u32> {
        self.slots.get(manager_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_from_slot() {
        assert_eq!(RoundTier::from_draft_slot(1), RoundTier::Early);
        assert_eq!(RoundTier::from_draft_slot(4), RoundTier::Early);
        assert_eq!(RoundTier::from_draft_slot(5), RoundTier::Mid);
        assert_eq!(RoundTier::from_draft_slot(8), RoundTier::Mid);
        assert_eq!(RoundTier::from_draft_slot(9), RoundTier::Late);
        assert_eq!(RoundTier::from_draft_slot(12), RoundTier::Late);
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!("mid".parse::<RoundTier>().unwrap(), RoundTier::Mid);
        assert_eq!(" Late ".parse::<RoundTier>().unwrap(), RoundTier::Late);
        assert!("middle".parse::<RoundTier>().is_err());
    }

    #[test]
    fn test_record_name_follows_tier() {
        let key = PickKey { season: 2026, round: 1, original_owner_id: "A".to_string() };
        let mut record = DraftPickRecord::new("L1", "S1", key, "A", RoundTier::Mid);
        assert_eq!(record.canonical_name(), "2026 Mid 1st");
        assert!(!record.is_traded());

        record.set_round_tier(RoundTier::Early);
        assert_eq!(record.canonical_name(), "2026 Early 1st");
        assert_eq!(record.round_tier(), RoundTier::Early);
    }

    #[test]
    fn test_fact_accepts_owned_by_alias() {
        let json = r#"{"season":2026,"round":2,"original_owner_id":"T1","owned_by":"M"}"#;
        let fact: OwnershipFact = serde_json::from_str(json).unwrap();
        assert_eq!(fact.current_owner_id.as_deref(), Some("M"));
        assert!(!fact.is_dated());
        assert!(!fact.is_self_reported());
        assert!(fact.clone().reported_by("M").is_self_reported());
    }
}
