//! Error types for the valuation service

use thiserror::Error;

/// Result type for valuation operations
pub type Result<T> = std::result::Result<T, ValuationError>;

/// Errors that can occur while loading valuations or writing rankings
#[derive(Error, Debug)]
pub enum ValuationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown rank source: {0}")]
    UnknownRankSource(String),

    #[error("Unknown roster format: {0}")]
    UnknownRosterFormat(String),

    #[error("Rank rows for league {found} passed to write for league {expected}")]
    LeagueMismatch { expected: String, found: String },
}
