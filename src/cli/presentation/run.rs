//! Run command presentation.

use crate::api::RunResponse;
use crate::error::AppError;
use owo_colors::OwoColorize;

pub fn format_run_json(response: &RunResponse) -> Result<String, AppError> {
    super::to_json(response)
}

pub fn format_run_text(response: &RunResponse) -> String {
    if !response.is_success() {
        return format!(
            "{} ({}): {}",
            "Workflow error".red().bold(),
            response.code,
            response.message
        );
    }

    let mut out = String::new();
    let outcome = match response.outcome {
        Some(outcome) if outcome.is_success() => outcome.to_string().green().to_string(),
        Some(outcome) => outcome.to_string().yellow().to_string(),
        None => "-".to_string(),
    };
    out.push_str(&format!("{}: {}\n", response.message.bold(), outcome));
    if let Some(run_id) = &response.run_id {
        out.push_str(&format!("Run: {}\n", run_id));
    }

    if let Some(state) = &response.final_state {
        out.push_str(&format!("Niche: {}\n", state.niche()));
        out.push_str(&format!("Topic: {}\n", state.topic.as_deref().unwrap_or("-")));
        out.push_str(&format!("Review passes: {}\n", state.iteration_count()));
        out.push_str(&format!(
            "Image: {}\n",
            state
                .image_asset_id
                .as_ref()
                .map(|a| a.as_str())
                .unwrap_or("(text only)")
        ));
        if let Some(published) = &response.published {
            out.push_str(&format!(
                "Post id: {}\n",
                published.post_id.as_deref().unwrap_or("-")
            ));
            if published.record_id.is_none() {
                out.push_str(&format!(
                    "{}\n",
                    "Post is live but its record was not saved".yellow()
                ));
            }
        }
        if let Some(post) = state.final_post() {
            out.push_str(&format!("\n{}\n{}\n", "Post".underline(), post));
        }
    }
    out.trim_end().to_string()
}
