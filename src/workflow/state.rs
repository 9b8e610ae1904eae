//! Workflow state: the single record threaded through every node.
//!
//! Nodes never mutate the state directly. They return a [`StateUpdate`] and the
//! driver applies it through [`WorkflowState::apply`], which is the one place
//! the data-model invariants are enforced.

use crate::error::WorkflowError;
use crate::workflow::node::Node;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix every platform asset reference carries
pub const ASSET_URN_PREFIX: &str = "urn:li:asset:";

/// A well-formed, non-empty asset reference returned by an upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId(String);

impl AssetId {
    /// Accepts only `urn:li:asset:<id>` with a non-empty, whitespace-free id.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let suffix = raw.strip_prefix(ASSET_URN_PREFIX)?;
        if suffix.is_empty() || suffix.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AssetId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AssetId::parse(&value).ok_or_else(|| format!("malformed asset id: {value:?}"))
    }
}

impl From<AssetId> for String {
    fn from(value: AssetId) -> Self {
        value.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWorkflowState")]
pub struct WorkflowState {
    niche: String,
    pub topic: Option<String>,
    pub draft: Option<String>,
    final_post: Option<String>,
    pub image_asset_id: Option<AssetId>,
    is_approved: bool,
    iteration_count: u32,
    pub current_node: Option<Node>,
}

/// Wire shape of [`WorkflowState`], checked before it becomes one.
#[derive(Deserialize)]
struct RawWorkflowState {
    niche: String,
    topic: Option<String>,
    draft: Option<String>,
    final_post: Option<String>,
    image_asset_id: Option<AssetId>,
    is_approved: bool,
    iteration_count: u32,
    current_node: Option<Node>,
}

impl TryFrom<RawWorkflowState> for WorkflowState {
    type Error = String;

    fn try_from(raw: RawWorkflowState) -> Result<Self, Self::Error> {
        if raw.niche.trim().is_empty() {
            return Err("niche must not be blank".to_string());
        }
        if raw.is_approved != raw.final_post.is_some() {
            return Err(format!(
                "is_approved is {} but final_post is {}",
                raw.is_approved,
                if raw.final_post.is_some() { "set" } else { "unset" }
            ));
        }
        if raw.final_post.as_deref().is_some_and(|post| post.trim().is_empty()) {
            return Err("final_post must not be blank".to_string());
        }
        Ok(Self {
            niche: raw.niche,
            topic: raw.topic,
            draft: raw.draft,
            final_post: raw.final_post,
            image_asset_id: raw.image_asset_id,
            is_approved: raw.is_approved,
            iteration_count: raw.iteration_count,
            current_node: raw.current_node,
        })
    }
}

impl WorkflowState {
    /// Fresh state for one run. The niche is trimmed and must not be blank.
    pub fn new(niche: impl Into<String>) -> Result<Self, WorkflowError> {
        let niche = niche.into().trim().to_string();
        if niche.is_empty() {
            return Err(WorkflowError::EmptyNiche);
        }
        Ok(Self {
            niche,
            topic: None,
            draft: None,
            final_post: None,
            image_asset_id: None,
            is_approved: false,
            iteration_count: 0,
            current_node: None,
        })
    }

    pub fn niche(&self) -> &str {
        &self.niche
    }

    pub fn final_post(&self) -> Option<&str> {
        self.final_post.as_deref()
    }

    pub fn is_approved(&self) -> bool {
        self.is_approved
    }

    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    /// Apply a node's partial update.
    ///
    /// Rejects updates that would lower `iteration_count`, approve twice, or
    /// approve without content. Nothing is applied when an update is rejected.
    pub fn apply(&mut self, update: StateUpdate) -> Result<(), WorkflowError> {
        if let Some(count) = update.iteration_count {
            if count < self.iteration_count {
                return Err(WorkflowError::InvariantViolation(format!(
                    "iteration_count would decrease from {} to {}",
                    self.iteration_count, count
                )));
            }
        }
        if let Some(ref post) = update.approved_post {
            if self.is_approved {
                return Err(WorkflowError::InvariantViolation(
                    "final_post is already frozen".to_string(),
                ));
            }
            if post.trim().is_empty() {
                return Err(WorkflowError::InvariantViolation(
                    "cannot approve an empty post".to_string(),
                ));
            }
        }

        if let Some(topic) = update.topic {
            self.topic = Some(topic);
        }
        if let Some(draft) = update.draft {
            self.draft = Some(draft);
        }
        if let Some(post) = update.approved_post {
            self.final_post = Some(post);
            self.is_approved = true;
        }
        if let Some(asset) = update.image_asset_id {
            self.image_asset_id = asset;
        }
        if let Some(count) = update.iteration_count {
            self.iteration_count = count;
        }
        self.current_node = Some(update.node);
        Ok(())
    }
}

/// Partial update produced by one node execution.
///
/// Approval is a single field so `final_post` and `is_approved` can only
/// change together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateUpdate {
    pub node: Node,
    pub topic: Option<String>,
    pub draft: Option<String>,
    pub approved_post: Option<String>,
    pub image_asset_id: Option<Option<AssetId>>,
    pub iteration_count: Option<u32>,
}

impl StateUpdate {
    pub fn for_node(node: Node) -> Self {
        Self {
            node,
            topic: None,
            draft: None,
            approved_post: None,
            image_asset_id: None,
            iteration_count: None,
        }
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn draft(mut self, draft: impl Into<String>) -> Self {
        self.draft = Some(draft.into());
        self
    }

    pub fn approve(mut self, post: impl Into<String>) -> Self {
        self.approved_post = Some(post.into());
        self
    }

    pub fn image_asset(mut self, asset: Option<AssetId>) -> Self {
        self.image_asset_id = Some(asset);
        self
    }

    pub fn iteration(mut self, count: u32) -> Self {
        self.iteration_count = Some(count);
        self
    }
}
