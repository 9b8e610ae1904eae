//! Deterministic stand-in content used when a text call fails.

use chrono::{SecondsFormat, Utc};

/// Strategy for the content a node substitutes when its service call fails.
pub trait FallbackStrategy: Send + Sync {
    /// Topic used when topic generation fails
    fn topic(&self, niche: &str) -> String;

    /// Draft used when content creation fails
    fn draft(&self, topic: &str) -> String;

    /// Review text used when the review call fails
    fn critique(&self, cap_reached: bool) -> String {
        if cap_reached {
            crate::workflow::prompts::APPROVAL_TOKEN.to_string()
        } else {
            "Minor rewrite suggested.".to_string()
        }
    }
}

/// Default strategy: embeds the current UTC time in the topic so repeated
/// degraded runs still produce distinct posts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampFallback;

impl FallbackStrategy for TimestampFallback {
    fn topic(&self, niche: &str) -> String {
        format!(
            "{niche} insight {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }

    fn draft(&self, topic: &str) -> String {
        format!("{topic}: quick insight")
    }
}

/// Fixed-text strategy, handy for reproducible runs and tests.
#[derive(Debug, Clone)]
pub struct StaticFallback {
    pub stamp: String,
}

impl StaticFallback {
    pub fn new(stamp: impl Into<String>) -> Self {
        Self {
            stamp: stamp.into(),
        }
    }
}

impl FallbackStrategy for StaticFallback {
    fn topic(&self, niche: &str) -> String {
        format!("{niche} insight {}", self.stamp)
    }

    fn draft(&self, topic: &str) -> String {
        format!("{topic}: quick insight")
    }
}
