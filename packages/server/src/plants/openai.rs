use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::generator::{ContentGenerator, GeneratedImage, GenerationError};
use crate::config::GeneratorConfig;

/// [`ContentGenerator`] speaking the OpenAI images and chat completions API.
pub struct OpenAiGenerator {
    client: Client,
    config: GeneratorConfig,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
    url: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn api_key(&self) -> Result<&str, GenerationError> {
        match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(GenerationError::NotConfigured("api key missing".into())),
        }
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Value,
    ) -> Result<T, GenerationError> {
        let url = format!("{}/{endpoint}", self.config.base_url.trim_end_matches('/'));
        let res = self
            .client
            .post(&url)
            .bearer_auth(self.api_key()?)
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| GenerationError::InvalidPayload(e.to_string()))
    }
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    #[instrument(skip_all, fields(model = %self.config.image_model))]
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, GenerationError> {
        let body = json!({
            "model": self.config.image_model,
            "prompt": prompt,
            "n": 1,
            "size": self.config.image_size,
            "response_format": "b64_json",
        });
        let res: ImagesResponse = self.post_json("images/generations", &body).await?;
        let datum = res
            .data
            .into_iter()
            .next()
            .ok_or(GenerationError::EmptyPayload)?;

        match (datum.b64_json, datum.url) {
            (Some(b64), _) if !b64.is_empty() => {
                let data = STANDARD
                    .decode(b64.as_bytes())
                    .map_err(|e| GenerationError::InvalidPayload(e.to_string()))?;
                if data.is_empty() {
                    return Err(GenerationError::EmptyPayload);
                }
                debug!(bytes = data.len(), "image generated");
                Ok(GeneratedImage::Bytes {
                    data,
                    content_type: "image/png".into(),
                })
            }
            (_, Some(url)) if !url.is_empty() => Ok(GeneratedImage::Url(url)),
            _ => Err(GenerationError::EmptyPayload),
        }
    }

    #[instrument(skip_all, fields(model = %self.config.text_model))]
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "model": self.config.text_model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.2,
        });
        let res: ChatResponse = self.post_json("chat/completions", &body).await?;

        res.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyPayload)
    }

    fn is_configured(&self) -> bool {
        self.api_key().is_ok()
    }
}
