//! Publishing service.
//!
//! [`LinkedInPublisher`] implements the two-call image flow (register an
//! upload, then send the bytes to the returned URL) and UGC post creation.
//! Credentials are passed in at construction; nothing is stored globally.

use crate::error::{ConfigurationError, PublishingError};
use crate::workflow::state::AssetId;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::Path;
use tracing::{error, info};

/// Result of a successful publish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishOutcome {
    pub status: u16,
    pub post_id: Option<String>,
    /// Platform response body (or `null` when empty)
    pub response: Value,
}

/// Publishing contract consumed by the workflow
#[async_trait]
pub trait PublishingService: Send + Sync {
    /// Upload an image file. `Ok(None)` when the platform returned no asset
    /// reference.
    async fn upload_asset(&self, file: &Path) -> Result<Option<String>, PublishingError>;

    async fn publish(
        &self,
        text: &str,
        asset: Option<&AssetId>,
    ) -> Result<PublishOutcome, PublishingError>;
}

const DEFAULT_API_BASE: &str = "https://api.linkedin.com/v2";
const RESTLI_PROTOCOL_VERSION: &str = "2.0.0";
const UPLOAD_MECHANISM: &str = "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest";

/// `[linkedin]` configuration section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkedInConfig {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub person_urn: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
}

/// Explicit publishing credentials
#[derive(Clone)]
pub struct LinkedInCredentials {
    access_token: String,
    person_urn: String,
}

impl LinkedInCredentials {
    pub fn new(
        access_token: impl Into<String>,
        person_urn: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let access_token = access_token.into();
        let person_urn = person_urn.into();
        if access_token.trim().is_empty() {
            return Err(ConfigurationError::MissingCredential("linkedin.access_token"));
        }
        if !person_urn.starts_with("urn:li:person:") {
            return Err(ConfigurationError::InvalidSetting {
                key: "linkedin.person_urn",
                message: format!("expected urn:li:person:<id>, got {:?}", person_urn),
            });
        }
        Ok(Self {
            access_token,
            person_urn,
        })
    }

    pub fn from_config(config: &LinkedInConfig) -> Result<Self, ConfigurationError> {
        let token = config
            .access_token
            .clone()
            .ok_or(ConfigurationError::MissingCredential("linkedin.access_token"))?;
        let urn = config
            .person_urn
            .clone()
            .ok_or(ConfigurationError::MissingCredential("linkedin.person_urn"))?;
        Self::new(token, urn)
    }

    pub fn person_urn(&self) -> &str {
        &self.person_urn
    }
}

impl fmt::Debug for LinkedInCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedInCredentials")
            .field("access_token", &"<redacted>")
            .field("person_urn", &self.person_urn)
            .finish()
    }
}

pub struct LinkedInPublisher {
    client: Client,
    credentials: LinkedInCredentials,
    api_base: String,
}

impl LinkedInPublisher {
    pub fn new(
        credentials: LinkedInCredentials,
        api_base: Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let client =
            crate::provider::build_http_client().map_err(|e| ConfigurationError::InvalidSetting {
                key: "linkedin",
                message: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            credentials,
            api_base: api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    pub fn from_config(config: &LinkedInConfig) -> Result<Self, ConfigurationError> {
        Self::new(
            LinkedInCredentials::from_config(config)?,
            config.api_base.clone(),
        )
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.credentials.access_token)
            .header("X-Restli-Protocol-Version", RESTLI_PROTOCOL_VERSION)
    }

    async fn register_upload(&self) -> Result<(String, String), PublishingError> {
        let payload = json!({
            "registerUploadRequest": {
                "recipes": ["urn:li:digitalmediaRecipe:feedshare-image"],
                "owner": self.credentials.person_urn,
                "serviceProvider": "LBA",
            }
        });
        let response = self
            .authed(
                self.client
                    .post(format!("{}/assets?action=registerUpload", self.api_base)),
            )
            .json(&payload)
            .send()
            .await
            .map_err(network_error)?;
        let body: Value = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| PublishingError::InvalidResponse(e.to_string()))?;

        let value = &body["value"];
        let asset = value["asset"].as_str().unwrap_or_default().to_string();
        let upload_url = value["uploadMechanism"][UPLOAD_MECHANISM]["uploadUrl"]
            .as_str()
            .ok_or_else(|| {
                PublishingError::InvalidResponse("registerUpload response has no uploadUrl".into())
            })?
            .to_string();
        Ok((asset, upload_url))
    }
}

fn network_error(err: reqwest::Error) -> PublishingError {
    PublishingError::Network(err.to_string())
}

async fn ensure_success(response: Response) -> Result<Response, PublishingError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(PublishingError::Rejected { status, body })
}

fn ugc_post_payload(author: &str, text: &str, asset: Option<&AssetId>) -> Value {
    let category = if asset.is_some() { "IMAGE" } else { "NONE" };
    let mut share = json!({
        "shareCommentary": { "text": text },
        "shareMediaCategory": category,
    });
    if let Some(asset) = asset {
        share["media"] = json!([{ "status": "READY", "media": asset.as_str() }]);
    }
    json!({
        "author": author,
        "lifecycleState": "PUBLISHED",
        "specificContent": { "com.linkedin.ugc.ShareContent": share },
        "visibility": { "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC" },
    })
}

#[async_trait]
impl PublishingService for LinkedInPublisher {
    async fn upload_asset(&self, file: &Path) -> Result<Option<String>, PublishingError> {
        let (asset, upload_url) = self.register_upload().await?;
        let bytes = tokio::fs::read(file).await?;

        let response = self
            .client
            .post(&upload_url)
            .bearer_auth(&self.credentials.access_token)
            .body(bytes)
            .send()
            .await
            .map_err(network_error)?;
        ensure_success(response).await?;

        if asset.is_empty() {
            return Ok(None);
        }
        info!(asset = %asset, "image uploaded");
        Ok(Some(asset))
    }

    async fn publish(
        &self,
        text: &str,
        asset: Option<&AssetId>,
    ) -> Result<PublishOutcome, PublishingError> {
        let payload = ugc_post_payload(&self.credentials.person_urn, text, asset);
        let response = self
            .authed(self.client.post(format!("{}/ugcPosts", self.api_base)))
            .json(&payload)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        let post_id = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(network_error)?;

        if status != 201 {
            error!(status, body = %body, "post rejected");
            return Err(PublishingError::Rejected { status, body });
        }

        let response = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).unwrap_or(Value::String(body))
        };
        let post_id = post_id.or_else(|| response["id"].as_str().map(str::to_string));
        Ok(PublishOutcome {
            status,
            post_id,
            response,
        })
    }
}
