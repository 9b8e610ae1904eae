//! Metrics and Post Record Stores
//!
//! Two small contracts the workflow consumes: a pair of monotonically
//! increasing outcome counters, and an append-only log of published posts.
//! Sled-backed implementations live in [`persistence`]; in-memory doubles in
//! [`memory`].

pub mod memory;
pub mod persistence;

pub use memory::{InMemoryMetricsStore, InMemoryRecordStore};
pub use persistence::{open_db, SledMetricsStore, SledPostStore};

use crate::error::PersistenceError;
use crate::workflow::state::AssetId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current counter totals. Both are zero before the first increment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub total_completed: u64,
    pub total_failed: u64,
}

/// Outcome counters
///
/// Increments are atomic read-modify-write and return the new total. Calls
/// may block on disk; the engine runs them on the blocking pool under the
/// call deadline.
pub trait MetricsStore: Send + Sync {
    fn increment_completed(&self) -> Result<u64, PersistenceError>;
    fn increment_failed(&self) -> Result<u64, PersistenceError>;
    fn read_summary(&self) -> Result<JobSummary, PersistenceError>;
}

/// One published post, as saved after a successful publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub platform: String,
    pub niche: String,
    pub topic: Option<String>,
    pub content: String,
    pub image_asset_id: Option<AssetId>,
    pub posted_at: DateTime<Utc>,
    /// Raw platform response, kept verbatim
    pub publish_response: Value,
}

/// A saved record together with its store-assigned id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPost {
    pub id: String,
    #[serde(flatten)]
    pub record: PostRecord,
}

pub trait RecordStore: Send + Sync {
    /// Persist a record and return its id
    fn save(&self, record: &PostRecord) -> Result<String, PersistenceError>;

    /// Most recent records first, at most `limit`
    fn list(&self, limit: usize) -> Result<Vec<StoredPost>, PersistenceError>;
}
