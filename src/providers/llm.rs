/*!
 * LLM-backed provider.
 *
 * Turns the pipeline operations into prompts, sends them through a
 * `CompletionBackend` and parses the JSON answers. Malformed answers are
 * reported as `ProviderError::ParseError`, which the retry loop treats as
 * transient.
 */

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use crate::errors::ProviderError;
use crate::language_utils::get_language_name;
use crate::translation::glossary::Glossary;
use crate::translation::prompts::{
    GlossaryTranslationResponse, PromptTemplate, TermExtractionResponse, TranslationPromptBuilder,
    glossary_translation_prompt, term_extraction_prompt,
};
use crate::translation::retry::RetryPolicy;
use super::{CallOptions, CompletionBackend, CompletionRequest, Provider};

/// Provider that talks to a language model
#[derive(Debug)]
pub struct LlmProvider<B: CompletionBackend> {
    backend: B,
    retry_delay: Duration,
    temperature: f32,
}

impl<B: CompletionBackend> LlmProvider<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            retry_delay: Duration::from_millis(1000),
            temperature: 0.3,
        }
    }

    /// Base delay between attempts
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn policy(&self, options: &CallOptions) -> RetryPolicy {
        RetryPolicy::new(options.max_retries, self.retry_delay)
    }

    async fn complete_json(&self, system: &str, prompt: &str) -> Result<Value, ProviderError> {
        let request = CompletionRequest {
            system: system.to_string(),
            prompt: prompt.to_string(),
            temperature: self.temperature,
            json: true,
        };
        let raw = self.backend.complete(&request).await?;
        parse_json_object(&raw)
    }
}

/// Readable language name for prompts, the raw code when unknown
fn language_label(code: &str) -> String {
    get_language_name(code).unwrap_or_else(|_| code.to_string())
}

/// Locate and parse the JSON object in a model answer.
///
/// Tolerates markdown code fences and prose around the object.
pub fn parse_json_object(raw: &str) -> Result<Value, ProviderError> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    let candidate = match (start, end) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => {
            return Err(ProviderError::ParseError(format!(
                "No JSON object in response: {}",
                super::excerpt(raw)
            )));
        }
    };

    serde_json::from_str(candidate)
        .map_err(|e| ProviderError::ParseError(format!("{} in response: {}", e, super::excerpt(raw))))
}

/// Read `translations` as an ordered list.
///
/// Entries may be plain strings or `{id, translated}` objects. Object
/// entries are ordered by id and the list stops at the first missing id.
pub fn parse_translations(value: &Value, expected: usize) -> Result<Vec<String>, ProviderError> {
    let items = value
        .get("translations")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::ParseError("Missing 'translations' array".to_string()))?;

    let mut by_id: HashMap<usize, String> = HashMap::new();
    for (position, item) in items.iter().enumerate() {
        match item {
            Value::String(text) => {
                by_id.insert(position, text.clone());
            }
            Value::Object(entry) => {
                let id = entry
                    .get("id")
                    .and_then(Value::as_u64)
                    .map(|id| id as usize)
                    .unwrap_or(position);
                if let Some(text) = entry.get("translated").and_then(Value::as_str) {
                    by_id.insert(id, text.to_string());
                }
            }
            _ => {}
        }
    }

    let mut ordered = Vec::with_capacity(expected);
    for id in 0..expected {
        match by_id.remove(&id) {
            Some(text) => ordered.push(text),
            None => break,
        }
    }
    Ok(ordered)
}

#[async_trait]
impl<B: CompletionBackend> Provider for LlmProvider<B> {
    fn name(&self) -> &str {
        self.backend.name()
    }

    async fn translate(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
        glossary: &Glossary,
        options: &CallOptions,
    ) -> Result<Vec<String>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let (system, prompt) =
            TranslationPromptBuilder::new(&language_label(source_language), &language_label(target_language))
                .with_texts(texts)
                .with_glossary(glossary)
                .with_context(options.context.as_deref())
                .build();

        let (system, prompt) = (&system, &prompt);
        let translations = self
            .policy(options)
            .run("translate", |_| async move {
                let value = self.complete_json(system, prompt).await?;
                parse_translations(&value, texts.len())
            })
            .await?;

        if translations.len() < texts.len() {
            debug!(
                "{} returned {} of {} translations",
                self.name(), translations.len(), texts.len()
            );
        }
        Ok(translations)
    }

    async fn extract_terms(&self, text: &str, options: &CallOptions) -> Result<Vec<String>, ProviderError> {
        let system = PromptTemplate::TERM_EXTRACTOR;
        let prompt = term_extraction_prompt(text, options.context.as_deref());
        let prompt = &prompt;

        self.policy(options)
            .run("extract_terms", |_| async move {
                let value = self.complete_json(system, prompt).await?;
                let response: TermExtractionResponse = serde_json::from_value(value)
                    .map_err(|e| ProviderError::ParseError(e.to_string()))?;

                let mut terms: Vec<String> = response
                    .terms
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
                terms.sort();
                terms.dedup();
                Ok(terms)
            })
            .await
    }

    async fn translate_glossary(
        &self,
        terms: &[String],
        source_language: &str,
        target_language: &str,
        options: &CallOptions,
    ) -> Result<HashMap<String, String>, ProviderError> {
        if terms.is_empty() {
            return Ok(HashMap::new());
        }

        let system = PromptTemplate::glossary_translator()
            .render(&language_label(source_language), &language_label(target_language));
        let prompt = glossary_translation_prompt(terms, options.context.as_deref());
        let (system, prompt) = (&system, &prompt);

        self.policy(options)
            .run("translate_glossary", |_| async move {
                let value = self.complete_json(system, prompt).await?;
                let response: GlossaryTranslationResponse = serde_json::from_value(value)
                    .map_err(|e| ProviderError::ParseError(e.to_string()))?;

                Ok(response
                    .translations
                    .into_iter()
                    .filter(|(term, translation)| terms.contains(term) && !translation.trim().is_empty())
                    .collect())
            })
            .await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.backend.ping().await
    }
}
