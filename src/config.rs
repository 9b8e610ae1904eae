//! Configuration System
//!
//! Layered configuration for the pipeline: built-in defaults, a global file,
//! workspace files and environment overrides, merged with the `config` crate
//! and validated as a whole before any service is built.

use crate::logging::LoggingConfig;
use crate::workflow::EngineSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use crate::image::ImageConfig;
pub use crate::provider::{ProviderConfig, ProviderType};
pub use crate::publishing::LinkedInConfig;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostsmithConfig {
    /// Text generation provider
    #[serde(default)]
    pub content: ProviderConfig,

    /// Image generation service
    #[serde(default)]
    pub image: ImageConfig,

    /// Publishing credentials
    #[serde(default)]
    pub linkedin: LinkedInConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Review passes before approval is forced
    #[serde(default = "default_max_review_iterations")]
    pub max_review_iterations: u32,

    /// Deadline for each leaf call, in seconds
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Platform label stored with each post record
    #[serde(default = "default_platform")]
    pub platform: String,
}

fn default_max_review_iterations() -> u32 {
    1
}

fn default_call_timeout_secs() -> u64 {
    120
}

fn default_platform() -> String {
    "linkedin".to_string()
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_review_iterations: default_max_review_iterations(),
            call_timeout_secs: default_call_timeout_secs(),
            platform: default_platform(),
        }
    }
}

impl WorkflowConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_review_iterations == 0 {
            return Err("max_review_iterations must be at least 1".to_string());
        }
        if self.call_timeout_secs == 0 {
            return Err("call_timeout_secs must be at least 1".to_string());
        }
        if self.platform.trim().is_empty() {
            return Err("platform cannot be empty".to_string());
        }
        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            max_review_iterations: self.max_review_iterations,
            call_timeout: Duration::from_secs(self.call_timeout_secs),
            platform: self.platform.clone(),
        }
    }
}

/// Storage paths
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database directory; defaults to the platform data dir
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Configured path, else `<data dir>/store`, else `.postsmith/store`.
    pub fn resolve_store_path(&self) -> PathBuf {
        if let Some(path) = &self.store_path {
            return path.clone();
        }
        directories::ProjectDirs::from("", "", "postsmith")
            .map(|dirs| dirs.data_dir().join("store"))
            .unwrap_or_else(|| PathBuf::from(".postsmith").join("store"))
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Content(String),
    Image(String),
    LinkedIn(String),
    Workflow(String),
    Storage(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Content(msg) => write!(f, "content: {}", msg),
            ValidationError::Image(msg) => write!(f, "image: {}", msg),
            ValidationError::LinkedIn(msg) => write!(f, "linkedin: {}", msg),
            ValidationError::Workflow(msg) => write!(f, "workflow: {}", msg),
            ValidationError::Storage(msg) => write!(f, "storage: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl PostsmithConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.content.validate() {
            errors.push(ValidationError::Content(e));
        }
        if let Err(e) = self.image.validate() {
            errors.push(ValidationError::Image(e));
        }
        if let Err(e) = crate::publishing::LinkedInCredentials::from_config(&self.linkedin) {
            errors.push(ValidationError::LinkedIn(e.to_string()));
        }
        if let Err(e) = self.workflow.validate() {
            errors.push(ValidationError::Workflow(e));
        }
        if let Some(path) = &self.storage.store_path {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::Storage(
                    "store_path cannot be empty".to_string(),
                ));
            }
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validation errors joined into one message
    pub fn validation_report(errors: &[ValidationError]) -> String {
        errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
