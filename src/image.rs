//! Image generation service.
//!
//! [`GeminiImageClient`] calls the Gemini `generateContent` endpoint with
//! image output enabled and returns the first inline image part, decoded.

use crate::error::{ConfigurationError, ImageError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

/// Image generation contract consumed by the workflow
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Raw image bytes, or `None` when the service produced no image
    async fn generate_image(&self, prompt: &str) -> Result<Option<Vec<u8>>, ImageError>;
}

const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";
const DEFAULT_IMAGE_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// `[image]` configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_image_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            model: default_image_model(),
            api_key: None,
            endpoint: None,
        }
    }
}

impl ImageConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Image model cannot be empty".to_string());
        }
        if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err("API key is required".to_string());
        }
        Ok(())
    }
}

pub struct GeminiImageClient {
    client: Client,
    model: String,
    api_key: String,
    endpoint: String,
}

impl GeminiImageClient {
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
        endpoint: Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let client =
            crate::provider::build_http_client().map_err(|e| ConfigurationError::InvalidSetting {
                key: "image",
                message: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            model: model.into(),
            api_key: api_key.into(),
            endpoint: endpoint
                .unwrap_or_else(|| DEFAULT_IMAGE_ENDPOINT.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    pub fn from_config(config: &ImageConfig) -> Result<Self, ConfigurationError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigurationError::MissingCredential("image.api_key"))?;
        Self::new(config.model.clone(), api_key, config.endpoint.clone())
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
struct InlineData {
    data: String,
}

fn first_inline_image(response: GenerateContentResponse) -> Result<Option<Vec<u8>>, ImageError> {
    let Some(inline) = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|content| content.parts.into_iter().find_map(|p| p.inline_data))
    else {
        return Ok(None);
    };
    let bytes = STANDARD
        .decode(inline.data.as_bytes())
        .map_err(|e| ImageError::Decode(e.to_string()))?;
    Ok(if bytes.is_empty() { None } else { Some(bytes) })
}

#[async_trait]
impl ImageService for GeminiImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<Option<Vec<u8>>, ImageError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
        });
        debug!(model = %self.model, "requesting image");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ImageError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ImageError::RequestFailed(format!("status {}: {}", status, text)));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ImageError::Decode(format!("Failed to parse response: {}", e)))?;
        let image = first_inline_image(parsed)?;
        if image.is_none() {
            warn!(model = %self.model, "image response carried no inline data");
        }
        Ok(image)
    }
}
