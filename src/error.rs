//! Error types for the postsmith content pipeline.
//!
//! Each leaf service has its own error enum so the workflow engine can decide,
//! per node, whether a failure is recoverable. `AppError` is the umbrella used
//! by the facade and the CLI.

use thiserror::Error;

/// Text generation (LLM) failures
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Provider request failed: {0}")]
    RequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    AuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Provider model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider returned an unusable response: {0}")]
    InvalidResponse(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Generation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Image generation or image upload failures
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image request failed: {0}")]
    RequestFailed(String),

    #[error("Image response could not be decoded: {0}")]
    Decode(String),

    #[error("Image scratch file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image generation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Publishing platform failures
#[derive(Debug, Error)]
pub enum PublishingError {
    #[error("Publishing rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Publishing network error: {0}")]
    Network(String),

    #[error("Publishing response could not be parsed: {0}")]
    InvalidResponse(String),

    #[error("Asset file could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("Publishing timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl PublishingError {
    /// HTTP-style status code, when the platform produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            PublishingError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Record and counter store failures
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Record could not be encoded: {0}")]
    Encode(String),

    #[error("Stored record is corrupt: {0}")]
    Corrupt(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl From<sled::Error> for PersistenceError {
    fn from(err: sled::Error) -> Self {
        PersistenceError::Backend(err.to_string())
    }
}

/// Missing or invalid configuration. Fatal; never retried.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Missing setting: {0}")]
    MissingSetting(&'static str),

    #[error("Invalid setting {key}: {message}")]
    InvalidSetting { key: &'static str, message: String },

    #[error("Configuration could not be loaded: {0}")]
    Load(String),
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(err: config::ConfigError) -> Self {
        ConfigurationError::Load(err.to_string())
    }
}

/// Faults inside the workflow engine itself. These are never recovered
/// locally; the run boundary converts them into an error envelope.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Niche must not be empty")]
    EmptyNiche,

    #[error("State invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Workflow exceeded {limit} node executions")]
    StepLimitExceeded { limit: usize },

    #[error("Workflow task aborted: {0}")]
    Aborted(String),
}

/// Umbrella error for the facade and CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Output error: {0}")]
    Output(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.into())
    }
}
