use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::InferenceConfig;
use crate::error::{InferenceError, Result};
use super::prompt::{build_user_message, DEFAULT_SYSTEM_PROMPT};
use super::{clean_translation, InferenceClient, TranslationRequest};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint
pub struct ChatCompletionClient {
    client: Client,
    config: InferenceConfig,
}

impl ChatCompletionClient {
    pub fn new(config: InferenceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    pub fn build_request(&self, request: &TranslationRequest) -> ChatCompletionRequest {
        let system_prompt = self
            .config
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        ChatCompletionRequest {
            model: request.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_user_message(request),
                },
            ],
            stream: false,
            temperature: self.config.temperature,
        }
    }
}

#[async_trait]
impl InferenceClient for ChatCompletionClient {
    async fn translate(&self, request: &TranslationRequest) -> std::result::Result<String, InferenceError> {
        let url = self.url("/v1/chat/completions");
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&self.build_request(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status { status, body });
        }

        let body = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| InferenceError::MalformedResponse(e.to_string()))?;

        let raw = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or(InferenceError::MissingContent)?;

        debug!("Raw model response: {}", raw);

        clean_translation(&raw).ok_or(InferenceError::EmptyTranslation)
    }

    async fn list_models(&self) -> Vec<String> {
        let url = self.url("/v1/models");

        let response = match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!("Model list request returned {}", response.status());
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to query model list: {}", e);
                return Vec::new();
            }
        };

        match response.json::<ModelList>().await {
            Ok(list) => list.data.into_iter().map(|model| model.id).collect(),
            Err(e) => {
                warn!("Failed to parse model list: {}", e);
                Vec::new()
            }
        }
    }
}
