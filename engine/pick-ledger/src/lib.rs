//! # Pick Ledger
//!
//! Draft pick identity for dynasty leagues: which future picks exist, who
//! originally held each one, and who holds it now.
//!
//! ## Architecture
//!
//! - **OwnershipResolver**: collapses raw, possibly duplicated platform facts
//!   into one record per original pick
//! - **CanonicalNamer**: derives the valuation key ("2026 Mid 2nd") for a pick
//! - **PickLedger**: snapshot-scoped storage with atomic replace
//!   (`InMemoryPickLedger`, `PgPickLedger`)
//!
//! ## Usage
//!
//! ```rust
//! use pick_ledger::{CanonicalNamer, OwnershipFact, OwnershipResolver, ResolverConfig};
//!
//! let resolver = OwnershipResolver::new(ResolverConfig::default(), CanonicalNamer::always_mid());
//! let facts = vec![OwnershipFact::new(2026, 2, "T1", "M")];
//! let resolution = resolver.resolve("league-1", "2025-w10", &facts, &[]);
//!
//! assert_eq!(resolution.records[0].canonical_name(), "2026 Mid 2nd");
//! assert_eq!(resolution.records[0].current_owner_id, "M");
//! ```

pub mod error;
pub mod ledger;
pub mod naming;
pub mod postgres;
pub mod resolver;
pub mod types;

pub use error::{LedgerError, Result};
pub use ledger::{InMemoryPickLedger, PickLedger};
pub use naming::{canonical_name, ordinal, CanonicalNamer, TierPolicy};
pub use postgres::PgPickLedger;
pub use resolver::{OwnershipResolver, Resolution, ResolverConfig, DEFAULT_MAX_ROUND};
pub use types::{DraftOrder, DraftPickRecord, ManagerId, OwnershipFact, PickKey, RoundTier};
