//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("content.provider_type", "openai")?
        .set_default("content.model", "gpt-4o")?
        .set_default("workflow.max_review_iterations", 1)?
        .set_default("workflow.call_timeout_secs", 120)?
        .set_default("workflow.platform", "linkedin")
}
