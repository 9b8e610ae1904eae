//! Summary and post log presentation.

use crate::error::AppError;
use crate::store::{JobSummary, StoredPost};
use comfy_table::Table;
use serde_json::json;

pub fn format_summary_text(summary: &JobSummary) -> String {
    format!(
        "Completed: {}\nFailed:    {}",
        summary.total_completed, summary.total_failed
    )
}

pub fn format_summary_json(summary: &JobSummary) -> Result<String, AppError> {
    super::to_json(summary)
}

fn preview(content: &str, max_chars: usize) -> String {
    let first_line = content.lines().next().unwrap_or_default();
    if first_line.chars().count() <= max_chars {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

pub fn format_posts_text(posts: &[StoredPost]) -> String {
    if posts.is_empty() {
        return "No posts recorded yet.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Id", "Posted At", "Niche", "Topic", "Image", "Content"]);
    for post in posts {
        let record = &post.record;
        table.add_row(vec![
            post.id.clone(),
            record.posted_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.niche.clone(),
            record.topic.clone().unwrap_or_else(|| "-".to_string()),
            if record.image_asset_id.is_some() { "yes" } else { "no" }.to_string(),
            preview(&record.content, 48),
        ]);
    }
    table.to_string()
}

pub fn format_posts_json(posts: &[StoredPost]) -> Result<String, AppError> {
    super::to_json(&json!({ "posts": posts, "total": posts.len() }))
}
