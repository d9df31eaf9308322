//! Error types for the pick ledger

use thiserror::Error;

/// Result type for pick ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while resolving or persisting draft picks
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(
        "Record for league {found_league}/{found_snapshot} passed to replace of {expected_league}/{expected_snapshot}"
    )]
    ScopeMismatch {
        expected_league: String,
        expected_snapshot: String,
        found_league: String,
        found_snapshot: String,
    },

    #[error("Invalid round tier: {0}")]
    InvalidTier(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl LedgerError {
    /// Create a new invalid record error
    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }
}
