//! Event schema for run progress.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::workflow::node::{Node, RunOutcome, Transition};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub ts: String,
    pub run: String,
    pub seq: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStartedData {
    pub niche: String,
    pub max_review_iterations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeCompletedData {
    pub node: Node,
    pub next: Transition,
    pub iteration_count: u32,
    pub is_approved: bool,
    pub duration_ms: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCompletedData {
    pub outcome: RunOutcome,
    pub steps: usize,
    pub duration_ms: u128,
}
