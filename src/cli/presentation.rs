//! CLI presentation: text and json formatters per command.

mod config;
mod run;
mod store;

pub use config::{format_validation_json, format_validation_text};
pub use run::{format_run_json, format_run_text};
pub use store::{format_posts_json, format_posts_text, format_summary_json, format_summary_text};

use crate::error::AppError;

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::Output(e.to_string()))
}
