//! Sled-backed metrics and post stores.
//!
//! Both stores share one `sled::Db` (sled holds an exclusive lock on its
//! directory) and use separate trees.

use crate::error::PersistenceError;
use crate::store::{JobSummary, MetricsStore, PostRecord, RecordStore, StoredPost};
use sled::{Db, Tree};
use std::path::Path;

const TREE_METRICS: &str = "metrics";
const TREE_POSTS: &str = "posts";
const KEY_COMPLETED: &[u8] = b"total_completed";
const KEY_FAILED: &[u8] = b"total_failed";

/// Open (or create) the database at `path`
pub fn open_db<P: AsRef<Path>>(path: P) -> Result<Db, PersistenceError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    sled::open(path).map_err(|e| {
        PersistenceError::Backend(format!(
            "Failed to open sled database at {}: {}",
            path.display(),
            e
        ))
    })
}

fn decode_counter(raw: Option<&[u8]>) -> Result<u64, PersistenceError> {
    match raw {
        None => Ok(0),
        Some(bytes) => {
            let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                PersistenceError::Corrupt(format!("counter has {} bytes, expected 8", bytes.len()))
            })?;
            Ok(u64::from_be_bytes(arr))
        }
    }
}

/// Counter tree with atomic upsert-on-first-use increments
#[derive(Clone)]
pub struct SledMetricsStore {
    metrics: Tree,
}

impl SledMetricsStore {
    pub fn new(db: &Db) -> Result<Self, PersistenceError> {
        Ok(Self {
            metrics: db.open_tree(TREE_METRICS)?,
        })
    }

    fn increment(&self, key: &[u8]) -> Result<u64, PersistenceError> {
        // update_and_fetch retries the closure under contention, so a corrupt
        // value is left untouched and reported after the fact.
        let updated = self.metrics.update_and_fetch(key, |old| {
            let next = match old {
                None => Some(1u64),
                Some(bytes) => <[u8; 8]>::try_from(bytes)
                    .ok()
                    .map(|arr| u64::from_be_bytes(arr).saturating_add(1)),
            };
            match next {
                Some(value) => Some(value.to_be_bytes().to_vec()),
                None => old.map(|bytes| bytes.to_vec()),
            }
        })?;
        self.metrics.flush()?;
        decode_counter(updated.as_deref())
    }
}

impl MetricsStore for SledMetricsStore {
    fn increment_completed(&self) -> Result<u64, PersistenceError> {
        self.increment(KEY_COMPLETED)
    }

    fn increment_failed(&self) -> Result<u64, PersistenceError> {
        self.increment(KEY_FAILED)
    }

    fn read_summary(&self) -> Result<JobSummary, PersistenceError> {
        Ok(JobSummary {
            total_completed: decode_counter(self.metrics.get(KEY_COMPLETED)?.as_deref())?,
            total_failed: decode_counter(self.metrics.get(KEY_FAILED)?.as_deref())?,
        })
    }
}

/// Post records keyed by `Db::generate_id`, big-endian so iteration order is
/// insertion order.
#[derive(Clone)]
pub struct SledPostStore {
    db: Db,
    posts: Tree,
}

impl SledPostStore {
    pub fn new(db: &Db) -> Result<Self, PersistenceError> {
        Ok(Self {
            db: db.clone(),
            posts: db.open_tree(TREE_POSTS)?,
        })
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

impl RecordStore for SledPostStore {
    fn save(&self, record: &PostRecord) -> Result<String, PersistenceError> {
        let id = self.db.generate_id()?;
        let value = serde_json::to_vec(record)
            .map_err(|e| PersistenceError::Encode(format!("Failed to serialize post: {}", e)))?;
        self.posts.insert(id.to_be_bytes(), value)?;
        self.posts.flush()?;
        Ok(id.to_string())
    }

    fn list(&self, limit: usize) -> Result<Vec<StoredPost>, PersistenceError> {
        let mut posts = Vec::new();
        for item in self.posts.iter().rev().take(limit) {
            let (key, value) = item?;
            let arr: [u8; 8] = key[..].try_into().map_err(|_| {
                PersistenceError::Corrupt(format!("post key has {} bytes", key.len()))
            })?;
            let record: PostRecord = serde_json::from_slice(&value).map_err(|e| {
                PersistenceError::Corrupt(format!("Failed to deserialize post: {}", e))
            })?;
            posts.push(StoredPost {
                id: u64::from_be_bytes(arr).to_string(),
                record,
            });
        }
        Ok(posts)
    }
}
