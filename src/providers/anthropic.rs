use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use super::{CompletionBackend, CompletionRequest, excerpt};

const API_VERSION: &str = "2023-06-01";

/// Completion budget per request; a batch answer stays well below it
const MAX_TOKENS: u32 = 4096;

/// Anthropic messages API client
#[derive(Debug)]
pub struct Anthropic {
    client: Client,
    api_key: String,
    /// Base URL without the `/v1/messages` suffix
    endpoint: String,
    model: String,
}

/// Body of a `/v1/messages` call
#[derive(Debug, Serialize)]
pub struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Anthropic response
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
}

/// One content block; only `text` blocks carry the answer
#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

impl MessagesResponse {
    /// Concatenated text of every `text` block
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect()
    }
}

impl Anthropic {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.endpoint.trim_end_matches('/'))
    }

    fn request<'a>(&'a self, system: Option<&'a str>, prompt: &'a str, max_tokens: u32) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens,
            system,
            temperature: None,
            messages: vec![Message { role: "user", content: prompt }],
        }
    }

    /// Send a messages request, single attempt
    pub async fn send(&self, request: &MessagesRequest<'_>) -> Result<MessagesResponse, ProviderError> {
        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Anthropic API error ({}): {}", status, excerpt(&body));
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        response
            .json::<MessagesResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Unreadable Anthropic response: {}", e)))
    }
}

#[async_trait]
impl CompletionBackend for Anthropic {
    fn name(&self) -> &str {
        "Anthropic"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let mut message = self.request(Some(request.system.as_str()), &request.prompt, MAX_TOKENS);
        message.temperature = Some(request.temperature);

        Ok(self.send(&message).await?.text())
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        self.send(&self.request(None, "ping", 1)).await.map(|_| ())
    }
}
