//! In-memory stores for tests and dry runs.

use crate::error::PersistenceError;
use crate::store::{JobSummary, MetricsStore, PostRecord, RecordStore, StoredPost};
use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct InMemoryMetricsStore {
    summary: Mutex<JobSummary>,
}

impl InMemoryMetricsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetricsStore for InMemoryMetricsStore {
    fn increment_completed(&self) -> Result<u64, PersistenceError> {
        let mut summary = self.summary.lock();
        summary.total_completed += 1;
        Ok(summary.total_completed)
    }

    fn increment_failed(&self) -> Result<u64, PersistenceError> {
        let mut summary = self.summary.lock();
        summary.total_failed += 1;
        Ok(summary.total_failed)
    }

    fn read_summary(&self) -> Result<JobSummary, PersistenceError> {
        Ok(*self.summary.lock())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    posts: Mutex<Vec<StoredPost>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<PostRecord> {
        self.posts.lock().iter().map(|p| p.record.clone()).collect()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn save(&self, record: &PostRecord) -> Result<String, PersistenceError> {
        let mut posts = self.posts.lock();
        let id = (posts.len() + 1).to_string();
        posts.push(StoredPost {
            id: id.clone(),
            record: record.clone(),
        });
        Ok(id)
    }

    fn list(&self, limit: usize) -> Result<Vec<StoredPost>, PersistenceError> {
        Ok(self.posts.lock().iter().rev().take(limit).cloned().collect())
    }
}
