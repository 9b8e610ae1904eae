//! Sled record store behaviour through the production toolbox.

use async_trait::async_trait;
use chrono::Utc;
use postsmith::error::{GenerationError, ImageError, PublishingError};
use postsmith::image::ImageService;
use postsmith::provider::ContentService;
use postsmith::publishing::{PublishOutcome, PublishingService};
use postsmith::store::{open_db, PostRecord, RecordStore, SledPostStore};
use postsmith::workflow::{AssetId, ServiceToolbox, Toolbox};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

struct Unused;

#[async_trait]
impl ContentService for Unused {
    async fn generate(&self, _: &str, _: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Provider("unused".to_string()))
    }
}

#[async_trait]
impl ImageService for Unused {
    async fn generate_image(&self, _: &str) -> Result<Option<Vec<u8>>, ImageError> {
        Ok(None)
    }
}

#[async_trait]
impl PublishingService for Unused {
    async fn upload_asset(&self, _: &Path) -> Result<Option<String>, PublishingError> {
        Ok(None)
    }

    async fn publish(
        &self,
        _: &str,
        _: Option<&AssetId>,
    ) -> Result<PublishOutcome, PublishingError> {
        Err(PublishingError::Network("unused".to_string()))
    }
}

fn record(content: &str, asset: Option<&str>) -> PostRecord {
    PostRecord {
        platform: "linkedin".to_string(),
        niche: "cloud computing".to_string(),
        topic: Some("Edge caching".to_string()),
        content: content.to_string(),
        image_asset_id: asset.and_then(AssetId::parse),
        posted_at: Utc::now(),
        publish_response: json!({ "status": 201, "post_id": "urn:li:share:1" }),
    }
}

fn toolbox(store: Arc<SledPostStore>) -> ServiceToolbox {
    let unused = Arc::new(Unused);
    ServiceToolbox::new(unused.clone(), unused.clone(), unused, store)
}

#[tokio::test]
async fn toolbox_saves_records_newest_first() {
    let temp = TempDir::new().unwrap();
    let db = open_db(temp.path().join("store")).unwrap();
    let store = Arc::new(SledPostStore::new(&db).unwrap());
    let tools = toolbox(store.clone());

    let first = tools.save_record(&record("first", None)).await.unwrap();
    let second = tools
        .save_record(&record("second", Some("urn:li:asset:X1")))
        .await
        .unwrap();
    let third = tools.save_record(&record("third", None)).await.unwrap();
    assert_ne!(first, second);
    assert_eq!(store.len(), 3);

    let listed = store.list(2).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, third);
    assert_eq!(listed[0].record.content, "third");
    assert_eq!(listed[1].id, second);
    assert_eq!(
        listed[1].record.image_asset_id.as_ref().map(|a| a.as_str()),
        Some("urn:li:asset:X1")
    );
}

#[tokio::test]
async fn stored_post_serializes_flat() {
    let temp = TempDir::new().unwrap();
    let db = open_db(temp.path().join("store")).unwrap();
    let store = SledPostStore::new(&db).unwrap();
    store.save(&record("hello", None)).unwrap();

    let listed = store.list(10).unwrap();
    let value = serde_json::to_value(&listed[0]).unwrap();
    assert!(value["id"].is_string());
    assert_eq!(value["content"], "hello");
    assert_eq!(value["niche"], "cloud computing");
    assert_eq!(value["publish_response"]["status"], 201);
    assert!(value.get("record").is_none());
}

#[tokio::test]
async fn empty_store_lists_nothing() {
    let temp = TempDir::new().unwrap();
    let db = open_db(temp.path().join("nested").join("store")).unwrap();
    let store = SledPostStore::new(&db).unwrap();
    assert!(store.is_empty());
    assert!(store.list(10).unwrap().is_empty());
    assert!(store.list(0).unwrap().is_empty());
}
