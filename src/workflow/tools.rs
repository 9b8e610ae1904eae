//! Leaf capabilities as seen by the workflow nodes.

use crate::error::{GenerationError, ImageError, PersistenceError, PublishingError};
use crate::image::ImageService;
use crate::provider::ContentService;
use crate::publishing::{PublishOutcome, PublishingService};
use crate::store::{PostRecord, RecordStore};
use crate::workflow::state::AssetId;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Everything a node may call out to. One implementation wires the real
/// services; tests substitute scripted doubles.
#[async_trait]
pub trait Toolbox: Send + Sync {
    async fn generate_text(
        &self,
        system_role: &str,
        user_context: &str,
    ) -> Result<String, GenerationError>;

    async fn generate_image(&self, prompt: &str) -> Result<Option<Vec<u8>>, ImageError>;

    async fn upload_asset(&self, file: &Path) -> Result<Option<String>, PublishingError>;

    async fn publish(
        &self,
        text: &str,
        asset: Option<&AssetId>,
    ) -> Result<PublishOutcome, PublishingError>;

    async fn save_record(&self, record: &PostRecord) -> Result<String, PersistenceError>;
}

#[derive(Clone)]
pub struct ServiceToolbox {
    content: Arc<dyn ContentService>,
    images: Arc<dyn ImageService>,
    publisher: Arc<dyn PublishingService>,
    records: Arc<dyn RecordStore>,
}

impl ServiceToolbox {
    pub fn new(
        content: Arc<dyn ContentService>,
        images: Arc<dyn ImageService>,
        publisher: Arc<dyn PublishingService>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            content,
            images,
            publisher,
            records,
        }
    }
}

#[async_trait]
impl Toolbox for ServiceToolbox {
    async fn generate_text(
        &self,
        system_role: &str,
        user_context: &str,
    ) -> Result<String, GenerationError> {
        self.content.generate(system_role, user_context).await
    }

    async fn generate_image(&self, prompt: &str) -> Result<Option<Vec<u8>>, ImageError> {
        self.images.generate_image(prompt).await
    }

    async fn upload_asset(&self, file: &Path) -> Result<Option<String>, PublishingError> {
        self.publisher.upload_asset(file).await
    }

    async fn publish(
        &self,
        text: &str,
        asset: Option<&AssetId>,
    ) -> Result<PublishOutcome, PublishingError> {
        self.publisher.publish(text, asset).await
    }

    async fn save_record(&self, record: &PostRecord) -> Result<String, PersistenceError> {
        // sled writes are short and synchronous; run them off the async path
        let records = Arc::clone(&self.records);
        let record = record.clone();
        tokio::task::spawn_blocking(move || records.save(&record))
            .await
            .map_err(|e| PersistenceError::Backend(format!("record task failed: {}", e)))?
    }
}
