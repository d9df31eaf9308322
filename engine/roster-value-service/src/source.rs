//! League snapshot sources
//!
//! A source hands the pipeline everything one league needs: managers,
//! rosters, raw pick ownership facts and, where the platform publishes it,
//! the draft order.

use crate::error::IngestError;
use pick_ledger::{DraftOrder, ManagerId, OwnershipFact};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use valuation_service::{RosterEntry, RosterFormat};

/// League host the snapshot was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Sleeper,
    Fleaflicker,
    Mfl,
}

impl Platform {
    /// Whether the platform reports traded picks at all; when it does not,
    /// untraded base picks are synthesized
    pub fn reports_pick_ownership(&self) -> bool {
        !matches!(self, Platform::Fleaflicker)
    }

    /// Whether the platform publishes draft slots for the upcoming draft
    pub fn reports_draft_order(&self) -> bool {
        matches!(self, Platform::Sleeper | Platform::Mfl)
    }
}

/// Everything fetched for one league
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeagueSnapshot {
    pub league_id: String,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub roster_format: Option<RosterFormat>,
    pub managers: Vec<ManagerId>,
    #[serde(default)]
    pub roster: Vec<RosterEntry>,
    #[serde(default)]
    pub facts: Vec<OwnershipFact>,
    #[serde(default)]
    pub draft_order: Option<DraftOrder>,
}

/// Failure reported by a source
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    /// Worth retrying (timeouts, rate limits, 5xx)
    #[error("transient: {0}")]
    Transient(String),

    #[error("fatal: {0}")]
    Fatal(String),
}

impl SourceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Transient(_))
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                SourceError::Fatal(err.to_string())
            }
            _ => SourceError::Transient(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Fatal(err.to_string())
    }
}

impl SourceError {
    /// Attach the league being fetched once retries are over
    pub fn into_ingest_error(self, league_id: &str, attempts: u32) -> IngestError {
        match self {
            SourceError::Transient(message) => {
                IngestError::SourceExhausted { league_id: league_id.to_string(), attempts, message }
            }
            SourceError::Fatal(message) => {
                IngestError::SourceRejected { league_id: league_id.to_string(), message }
            }
        }
    }
}

/// Provider of league snapshots
#[async_trait::async_trait]
pub trait PlatformSource: Send + Sync {
    async fn fetch(&self, league_id: &str) -> std::result::Result<LeagueSnapshot, SourceError>;

    /// League ids this source can serve
    async fn league_ids(&self) -> std::result::Result<Vec<String>, SourceError>;
}

/// Snapshots read from JSON files.
///
/// A file may hold a single `LeagueSnapshot` or an array of them.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    paths: Vec<PathBuf>,
}

impl JsonFileSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self { paths: vec![path.into()] }
    }

    async fn read_all(&self) -> std::result::Result<HashMap<String, LeagueSnapshot>, SourceError> {
        let mut leagues = HashMap::new();
        for path in &self.paths {
            for snapshot in read_snapshot_file(path).await? {
                leagues.insert(snapshot.league_id.clone(), snapshot);
            }
        }
        Ok(leagues)
    }
}

async fn read_snapshot_file(path: &Path) -> std::result::Result<Vec<LeagueSnapshot>, SourceError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let snapshots = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    Ok(snapshots)
}

#[async_trait::async_trait]
impl PlatformSource for JsonFileSource {
    async fn fetch(&self, league_id: &str) -> std::result::Result<LeagueSnapshot, SourceError> {
        self.read_all()
            .await?
            .remove(league_id)
            .ok_or_else(|| SourceError::Fatal(format!("league {league_id} not found in snapshot files")))
    }

    async fn league_ids(&self) -> std::result::Result<Vec<String>, SourceError> {
        let mut ids: Vec<String> = self.read_all().await?.into_keys().collect();
        ids.sort();
        Ok(ids)
    }
}
