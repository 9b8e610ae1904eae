//! Shared test utilities for integration tests
//!
//! A scripted [`Toolbox`] double whose text replies are queued per node role,
//! plus a helper that serializes environment variable changes across tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use postsmith::error::{GenerationError, ImageError, PersistenceError, PublishingError};
use postsmith::publishing::PublishOutcome;
use postsmith::store::PostRecord;
use postsmith::workflow::{prompts, AssetId, Toolbox};
use serde_json::json;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One text reply: `Err` simulates a provider failure.
pub type TextReply = Result<String, String>;

/// Text call as seen by the double
#[derive(Debug, Clone)]
pub struct TextCall {
    pub role: &'static str,
    pub context: String,
}

/// Scripted leaf services.
///
/// Each text role has its own reply queue; an exhausted queue fails the call.
pub struct ScriptedToolbox {
    topics: Mutex<VecDeque<TextReply>>,
    drafts: Mutex<VecDeque<TextReply>>,
    reviews: Mutex<VecDeque<TextReply>>,
    image: Result<Option<Vec<u8>>, String>,
    upload: Result<Option<String>, u16>,
    publish: Result<Option<String>, u16>,
    save_fails: bool,
    text_delay: Option<Duration>,
    pub text_calls: Mutex<Vec<TextCall>>,
    pub staged_files: Mutex<Vec<PathBuf>>,
    pub published: Mutex<Vec<(String, Option<String>)>>,
    pub saved: Mutex<Vec<PostRecord>>,
}

impl ScriptedToolbox {
    /// Every call succeeds and the first review approves.
    pub fn happy(topic: &str, draft: &str) -> Self {
        Self {
            topics: Mutex::new(VecDeque::from([Ok(topic.to_string())])),
            drafts: Mutex::new(VecDeque::from([Ok(draft.to_string())])),
            reviews: Mutex::new(VecDeque::from([Ok("APPROVED".to_string())])),
            image: Ok(Some(vec![0x89, b'P', b'N', b'G'])),
            upload: Ok(Some("urn:li:asset:D4E10AQ".to_string())),
            publish: Ok(Some("urn:li:share:7001".to_string())),
            save_fails: false,
            text_delay: None,
            text_calls: Mutex::new(Vec::new()),
            staged_files: Mutex::new(Vec::new()),
            published: Mutex::new(Vec::new()),
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Every text call fails; everything else succeeds.
    pub fn text_down() -> Self {
        let mut tools = Self::happy("", "");
        tools.topics = Mutex::new(VecDeque::new());
        tools.drafts = Mutex::new(VecDeque::new());
        tools.reviews = Mutex::new(VecDeque::new());
        tools
    }

    pub fn with_drafts(self, drafts: Vec<TextReply>) -> Self {
        *self.drafts.lock() = drafts.into();
        self
    }

    pub fn with_reviews(self, reviews: Vec<TextReply>) -> Self {
        *self.reviews.lock() = reviews.into();
        self
    }

    pub fn with_image(mut self, image: Result<Option<Vec<u8>>, String>) -> Self {
        self.image = image;
        self
    }

    pub fn with_upload(mut self, upload: Result<Option<String>, u16>) -> Self {
        self.upload = upload;
        self
    }

    pub fn with_publish(mut self, publish: Result<Option<String>, u16>) -> Self {
        self.publish = publish;
        self
    }

    pub fn with_failing_save(mut self) -> Self {
        self.save_fails = true;
        self
    }

    pub fn with_text_delay(mut self, delay: Duration) -> Self {
        self.text_delay = Some(delay);
        self
    }

    pub fn calls_for(&self, role: &str) -> Vec<TextCall> {
        self.text_calls
            .lock()
            .iter()
            .filter(|call| call.role == role)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Toolbox for ScriptedToolbox {
    async fn generate_text(
        &self,
        system_role: &str,
        user_context: &str,
    ) -> Result<String, GenerationError> {
        let (role, queue) = if system_role == prompts::TOPIC_GENERATOR_ROLE {
            (prompts::TOPIC_GENERATOR_ROLE, &self.topics)
        } else if system_role == prompts::CONTENT_CREATOR_ROLE {
            (prompts::CONTENT_CREATOR_ROLE, &self.drafts)
        } else if system_role == prompts::REVIEWER_ROLE {
            (prompts::REVIEWER_ROLE, &self.reviews)
        } else {
            return Err(GenerationError::Provider(format!(
                "unexpected role: {system_role}"
            )));
        };
        self.text_calls.lock().push(TextCall {
            role,
            context: user_context.to_string(),
        });

        if let Some(delay) = self.text_delay {
            tokio::time::sleep(delay).await;
        }

        let reply = queue.lock().pop_front();
        match reply {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(GenerationError::Provider(message)),
            None => Err(GenerationError::RequestFailed("service unavailable".to_string())),
        }
    }

    async fn generate_image(&self, _prompt: &str) -> Result<Option<Vec<u8>>, ImageError> {
        self.image.clone().map_err(ImageError::RequestFailed)
    }

    async fn upload_asset(&self, file: &Path) -> Result<Option<String>, PublishingError> {
        assert!(file.exists(), "staged image must exist during upload");
        self.staged_files.lock().push(file.to_path_buf());
        self.upload.clone().map_err(|status| PublishingError::Rejected {
            status,
            body: "upload refused".to_string(),
        })
    }

    async fn publish(
        &self,
        text: &str,
        asset: Option<&AssetId>,
    ) -> Result<PublishOutcome, PublishingError> {
        self.published
            .lock()
            .push((text.to_string(), asset.map(|a| a.as_str().to_string())));
        match &self.publish {
            Ok(post_id) => Ok(PublishOutcome {
                status: 201,
                post_id: post_id.clone(),
                response: json!({ "id": post_id }),
            }),
            Err(status) => Err(PublishingError::Rejected {
                status: *status,
                body: "{\"message\":\"rejected\"}".to_string(),
            }),
        }
    }

    async fn save_record(&self, record: &PostRecord) -> Result<String, PersistenceError> {
        if self.save_fails {
            return Err(PersistenceError::Backend("disk full".to_string()));
        }
        let mut saved = self.saved.lock();
        saved.push(record.clone());
        Ok(saved.len().to_string())
    }
}

static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Run `f` with the given environment variables set (or removed for `None`),
/// restoring the previous values afterwards. Calls are serialized.
pub fn with_env<F, R>(vars: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(key, _)| (key.to_string(), std::env::var(key).ok()))
        .collect();

    for (key, value) in vars {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

    for (key, value) in saved {
        match value {
            Some(value) => std::env::set_var(&key, value),
            None => std::env::remove_var(&key),
        }
    }

    match result {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
