//! Integration tests for the postsmith content pipeline

mod cli_parse;
mod config_integration;
mod sled_stores;
mod test_utils;

pub use test_utils::{with_env, ScriptedToolbox};
