//! CLI output: command result and error mapping to the CLI surface.

use crate::error::AppError;

/// Rendered command result. `ok == false` maps to a non-zero exit status
/// even though the command itself produced output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub body: String,
    pub ok: bool,
}

impl CommandOutput {
    pub fn ok(body: String) -> Self {
        Self { body, ok: true }
    }

    pub fn failed(body: String) -> Self {
        Self { body, ok: false }
    }
}

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &AppError) -> String {
    match e {
        AppError::Configuration(err) => format!(
            "Configuration error: {}\n\nRun 'postsmith validate' for a full report.",
            err
        ),
        other => format!("Error: {}", other),
    }
}
