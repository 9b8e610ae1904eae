//! Postsmith: topic-to-post content pipeline
//!
//! Drives one post per run through topic generation, drafting, a bounded
//! review loop, image generation and publishing, recording completed and
//! failed runs in a persistent store.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod image;
pub mod logging;
pub mod progress;
pub mod provider;
pub mod publishing;
pub mod store;
pub mod workflow;

pub use api::{RunResponse, WorkflowApi};
pub use error::{AppError, WorkflowError};
pub use workflow::{RunOutcome, RunReport, WorkflowEngine, WorkflowState};
