/*!
 * Provider implementations for different translation services.
 *
 * A `Provider` exposes the three operations the pipeline needs: content
 * translation, term extraction and glossary translation. The LLM-backed
 * provider builds prompts, parses JSON answers and retries, while the
 * backends below only perform single completion requests:
 * - Ollama: Local LLM server
 * - OpenAI-compatible: OpenAI, OpenRouter and LM Studio
 * - Anthropic: Anthropic API integration
 */

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::app_config::{Config, TranslationProvider};
use crate::errors::ProviderError;
use crate::translation::glossary::Glossary;

pub mod anthropic;
pub mod llm;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use llm::LlmProvider;

/// Per-call options shared by every provider operation
#[derive(Debug, Clone, PartialEq)]
pub struct CallOptions {
    /// Project context added to the prompt
    pub context: Option<String>,
    /// Total attempts before giving up
    pub max_retries: u32,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            context: None,
            max_retries: 3,
        }
    }
}

impl CallOptions {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }
}

/// Capability interface of a translation provider
///
/// Every operation retries internally up to `options.max_retries` attempts.
/// Exhaustion is reported as `ProviderError::RetriesExhausted`.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Human readable provider name
    fn name(&self) -> &str;

    /// Translate texts, returning translations in input order.
    ///
    /// The result may be shorter than the input; callers pad it.
    async fn translate(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
        glossary: &Glossary,
        options: &CallOptions,
    ) -> Result<Vec<String>, ProviderError>;

    /// Extract glossary-worthy terms. An empty list is a valid answer.
    async fn extract_terms(&self, text: &str, options: &CallOptions) -> Result<Vec<String>, ProviderError>;

    /// Translate glossary terms, keyed by the source term
    async fn translate_glossary(
        &self,
        terms: &[String],
        source_language: &str,
        target_language: &str,
        options: &CallOptions,
    ) -> Result<HashMap<String, String>, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// A single completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    /// Ask the backend for a JSON-only answer when it supports it
    pub json: bool,
}

/// Single-shot completion API underneath `LlmProvider`
#[async_trait]
pub trait CompletionBackend: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Run one completion, without retrying
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;

    /// Cheap request proving the service is reachable
    async fn ping(&self) -> Result<(), ProviderError>;
}

/// Normalize an endpoint into a base URL without a trailing slash
pub(crate) fn base_url(endpoint: &str) -> Result<String> {
    let parsed = url::Url::parse(endpoint)
        .map_err(|e| anyhow!("Invalid provider endpoint '{}': {}", endpoint, e))?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Build the provider selected in the configuration
pub fn create_provider(config: &Config) -> Result<Arc<dyn Provider>> {
    let translation = &config.translation;
    let endpoint = base_url(&translation.get_endpoint())?;
    let model = translation.get_model();
    let api_key = translation.get_api_key();
    let timeout = Duration::from_secs(translation.get_timeout_secs());
    let retry_delay = Duration::from_millis(translation.common.retry_delay_ms);
    let temperature = translation.common.temperature;

    let provider: Arc<dyn Provider> = match translation.provider {
        TranslationProvider::Ollama => Arc::new(
            LlmProvider::new(ollama::Ollama::new(endpoint, model, timeout))
                .with_retry_delay(retry_delay)
                .with_temperature(temperature),
        ),
        TranslationProvider::OpenAI | TranslationProvider::OpenRouter | TranslationProvider::LMStudio => {
            let backend = openai::OpenAi::new(translation.provider, endpoint, model, api_key, timeout);
            Arc::new(
                LlmProvider::new(backend)
                    .with_retry_delay(retry_delay)
                    .with_temperature(temperature),
            )
        }
        TranslationProvider::Anthropic => Arc::new(
            LlmProvider::new(anthropic::Anthropic::new(api_key, endpoint, model, timeout))
                .with_retry_delay(retry_delay)
                .with_temperature(temperature),
        ),
    };

    Ok(provider)
}

/// Trimmed body excerpt for error messages
pub(crate) fn excerpt(text: &str) -> String {
    if text.chars().count() > 500 {
        text.chars().take(500).collect::<String>()
    } else {
        text.to_string()
    }
}
