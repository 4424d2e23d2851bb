use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app_config::TranslationProvider;
use crate::errors::ProviderError;
use super::{CompletionBackend, CompletionRequest, excerpt};

/// Client for OpenAI-compatible chat completion APIs
///
/// Serves OpenAI itself, OpenRouter and the LM Studio local server.
#[derive(Debug)]
pub struct OpenAi {
    kind: TranslationProvider,
    client: Client,
    /// Base URL ending in the API version, e.g. `https://api.openai.com/v1`
    endpoint: String,
    model: String,
    /// Empty for local servers
    api_key: String,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

impl OpenAi {
    pub fn new(
        kind: TranslationProvider,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            kind,
            client: Client::builder()
                .timeout(timeout)
                .pool_max_idle_per_host(20)
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// LM Studio rejects `json_object`; hosted APIs accept it
    fn supports_json_mode(&self) -> bool {
        !matches!(self.kind, TranslationProvider::LMStudio)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.api_key)
        }
    }

    /// Send a chat completion request, single attempt
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.endpoint);

        let response = self
            .authorized(self.client.post(&url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("{} API error ({}): {}", self.kind.display_name(), status, excerpt(&error_text));
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        response.json::<ChatResponse>().await.map_err(|e| {
            ProviderError::ParseError(format!(
                "Failed to parse {} API response: {}",
                self.kind.display_name(),
                e
            ))
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAi {
    fn name(&self) -> &str {
        self.kind.display_name()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let chat = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage { role: "system".to_string(), content: request.system.clone() },
                ChatMessage { role: "user".to_string(), content: request.prompt.clone() },
            ],
            temperature: Some(request.temperature),
            response_format: (request.json && self.supports_json_mode()).then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let response = self.chat(&chat).await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::ParseError("Response contained no choices".to_string()))
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        let url = format!("{}/models", self.endpoint);
        let response = self.authorized(self.client.get(&url)).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            Err(ProviderError::from_status(status, response.text().await.unwrap_or_default()))
        }
    }
}
