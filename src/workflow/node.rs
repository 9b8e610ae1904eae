//! Node tags, transitions and the review exit decision.

use crate::workflow::state::WorkflowState;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    TopicGeneration,
    ContentCreation,
    Review,
    ImageGeneration,
    PostExecution,
}

impl Node {
    pub const INITIAL: Node = Node::TopicGeneration;

    pub fn as_str(self) -> &'static str {
        match self {
            Node::TopicGeneration => "topic_generation",
            Node::ContentCreation => "content_creation",
            Node::Review => "review",
            Node::ImageGeneration => "image_generation",
            Node::PostExecution => "post_execution",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    PostSuccess,
    PostFailed,
}

impl RunOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RunOutcome::PostSuccess => "post_success",
            RunOutcome::PostFailed => "post_failed",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, RunOutcome::PostSuccess)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Transition {
    Next(Node),
    Terminal(RunOutcome),
}

/// Exit decision after Review: the only branch in the graph.
pub fn route(state: &WorkflowState) -> Node {
    if state.is_approved() {
        Node::ImageGeneration
    } else {
        Node::ContentCreation
    }
}

/// Upper bound on node executions for a given review cap.
///
/// Every review pass that loops back costs a creation and a review; the
/// remaining stages run once.
pub fn max_node_executions(review_cap: u32) -> usize {
    let cap = review_cap.max(1) as usize;
    cap * 2 + 3
}
