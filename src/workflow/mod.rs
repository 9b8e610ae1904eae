//! Content workflow
//!
//! The five-node pipeline (topic, draft, review loop, image, publish) as an
//! explicit state machine. See [`engine::WorkflowEngine`] for the driver.

pub mod engine;
pub mod fallback;
pub mod node;
pub mod prompts;
pub mod state;
pub mod tools;

pub use engine::{EngineSettings, PublishReceipt, RunReport, StepSnapshot, WorkflowEngine};
pub use fallback::{FallbackStrategy, StaticFallback, TimestampFallback};
pub use node::{max_node_executions, route, Node, RunOutcome, Transition};
pub use state::{AssetId, StateUpdate, WorkflowState};
pub use tools::{ServiceToolbox, Toolbox};
