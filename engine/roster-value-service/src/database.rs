//! Connection pool owned by the caller and handed to each store

use crate::config::DatabaseConfig;
use crate::error::Result;
use pick_ledger::PgPickLedger;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;
use valuation_service::{PgRankSummaryStore, PgValuationSource};

/// PostgreSQL handle for the service's stores
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;

        info!("Connected to PostgreSQL (max {} connections)", config.max_connections);

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn pick_ledger(&self) -> PgPickLedger {
        PgPickLedger::new(self.pool.clone())
    }

    pub fn rank_store(&self) -> PgRankSummaryStore {
        PgRankSummaryStore::new(self.pool.clone())
    }

    pub fn valuation_source(&self) -> PgValuationSource {
        PgValuationSource::new(self.pool.clone())
    }

    /// Apply the ledger and valuation schemas
    pub async fn migrate(&self) -> Result<()> {
        self.pick_ledger().migrate().await?;
        self.rank_store().migrate().await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
