//! Validate command presentation.

use crate::config::{PostsmithConfig, ValidationError};
use crate::error::AppError;
use serde_json::json;

pub fn format_validation_text(result: &Result<(), Vec<ValidationError>>) -> String {
    match result {
        Ok(()) => "Configuration is valid.".to_string(),
        Err(errors) => format!(
            "Configuration has {} problem(s):\n{}",
            errors.len(),
            PostsmithConfig::validation_report(errors)
        ),
    }
}

pub fn format_validation_json(result: &Result<(), Vec<ValidationError>>) -> Result<String, AppError> {
    let errors: Vec<String> = match result {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    };
    super::to_json(&json!({ "valid": errors.is_empty(), "errors": errors }))
}
