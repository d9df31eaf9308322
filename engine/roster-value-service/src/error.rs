//! Error types for league ingestion

use thiserror::Error;

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors that fail a single league's ingestion
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Source for league {league_id} failed after {attempts} attempts: {message}")]
    SourceExhausted { league_id: String, attempts: u32, message: String },

    #[error("Source for league {league_id} rejected the request: {message}")]
    SourceRejected { league_id: String, message: String },

    #[error("Ledger error: {0}")]
    Ledger(#[from] pick_ledger::LedgerError),

    #[error("Valuation error: {0}")]
    Valuation(#[from] valuation_service::ValuationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Scheduler closed before league {league_id} could run")]
    SchedulerClosed { league_id: String },

    #[error("Ingestion task panicked or was cancelled: {0}")]
    Task(#[from] tokio::task::JoinError),
}
