/*!
 * Mock provider implementations for testing.
 *
 * This module provides two test doubles:
 * - `MockProvider` implements the operation-level `Provider` trait:
 *   - `MockProvider::working()` - Always succeeds with tagged translations
 *   - `MockProvider::failing()` - Always exhausts its retries
 *   - `MockProvider::short(n)` - Drops the last `n` translations of each call
 *   - `MockProvider::fail_first(n)` - Fails the first `n` calls, then works
 *   - `MockProvider::staggered(step, calls)` - Earlier calls take longer, so
 *     concurrent calls complete in reverse order
 * - `MockBackend` implements `CompletionBackend` with scripted raw answers,
 *   for exercising `LlmProvider` parsing and retries.
 */

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::ProviderError;
use crate::translation::glossary::Glossary;
use super::{CallOptions, CompletionBackend, CompletionRequest, Provider};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Always fails after consuming the whole retry budget
    Failing,
    /// Returns `missing` fewer translations than requested
    Short { missing: usize },
    /// Fails the first `failures` calls of any operation
    FailFirst { failures: usize },
    /// Call `n` (0-based) sleeps `step_ms * (calls - n)`
    Staggered { step_ms: u64, calls: usize },
}

/// Mock provider for testing pipeline behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    /// Calls per operation, shared between clones
    calls: Arc<Mutex<HashMap<&'static str, usize>>>,
    /// Texts received by each translate call
    translate_requests: Arc<Mutex<Vec<Vec<String>>>>,
    /// Fixed extraction answers keyed by a substring of the input
    extraction_script: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    total_calls: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(Mutex::new(HashMap::new())),
            translate_requests: Arc::new(Mutex::new(Vec::new())),
            extraction_script: Arc::new(Mutex::new(Vec::new())),
            total_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn short(missing: usize) -> Self {
        Self::new(MockBehavior::Short { missing })
    }

    pub fn fail_first(failures: usize) -> Self {
        Self::new(MockBehavior::FailFirst { failures })
    }

    pub fn staggered(step_ms: u64, calls: usize) -> Self {
        Self::new(MockBehavior::Staggered { step_ms, calls })
    }

    /// Answer `extract_terms` with `terms` whenever the text contains `needle`
    pub fn with_extraction(self, needle: &str, terms: &[&str]) -> Self {
        self.extraction_script
            .lock()
            .push((needle.to_string(), terms.iter().map(|t| t.to_string()).collect()));
        self
    }

    /// The translation the working mock produces for a text
    pub fn translated(text: &str, target_language: &str) -> String {
        format!("[{}] {}", target_language, text)
    }

    /// Number of calls made to an operation
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls.lock().get(operation).copied().unwrap_or(0)
    }

    /// Texts sent with every translate call, in call order
    pub fn translate_requests(&self) -> Vec<Vec<String>> {
        self.translate_requests.lock().clone()
    }

    async fn enter(&self, operation: &'static str, options: &CallOptions) -> Result<(), ProviderError> {
        *self.calls.lock().entry(operation).or_insert(0) += 1;
        let count = self.total_calls.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::RetriesExhausted {
                operation: operation.to_string(),
                attempts: options.max_retries.max(1),
                last_error: "Simulated provider failure".to_string(),
            }),
            MockBehavior::FailFirst { failures } if count < failures => Err(ProviderError::RetriesExhausted {
                operation: operation.to_string(),
                attempts: options.max_retries.max(1),
                last_error: format!("Simulated failure (call #{})", count + 1),
            }),
            MockBehavior::Staggered { step_ms, calls } => {
                let remaining = calls.saturating_sub(count) as u64;
                tokio::time::sleep(Duration::from_millis(step_ms * remaining)).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn translate(
        &self,
        texts: &[String],
        _source_language: &str,
        target_language: &str,
        _glossary: &Glossary,
        options: &CallOptions,
    ) -> Result<Vec<String>, ProviderError> {
        self.translate_requests.lock().push(texts.to_vec());
        self.enter("translate", options).await?;

        let keep = match self.behavior {
            MockBehavior::Short { missing } => texts.len().saturating_sub(missing),
            _ => texts.len(),
        };
        Ok(texts
            .iter()
            .take(keep)
            .map(|text| Self::translated(text, target_language))
            .collect())
    }

    async fn extract_terms(&self, text: &str, options: &CallOptions) -> Result<Vec<String>, ProviderError> {
        self.enter("extract_terms", options).await?;

        let script = self.extraction_script.lock();
        let mut terms: Vec<String> = script
            .iter()
            .filter(|(needle, _)| text.contains(needle.as_str()))
            .flat_map(|(_, terms)| terms.iter().cloned())
            .collect();
        terms.sort();
        terms.dedup();
        Ok(terms)
    }

    async fn translate_glossary(
        &self,
        terms: &[String],
        _source_language: &str,
        target_language: &str,
        options: &CallOptions,
    ) -> Result<HashMap<String, String>, ProviderError> {
        self.enter("translate_glossary", options).await?;

        let keep = match self.behavior {
            MockBehavior::Short { missing } => terms.len().saturating_sub(missing),
            _ => terms.len(),
        };
        Ok(terms
            .iter()
            .take(keep)
            .map(|term| (term.clone(), Self::translated(term, target_language)))
            .collect())
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated outage".to_string())),
            _ => Ok(()),
        }
    }
}

/// Completion backend that replays scripted answers
#[derive(Debug, Clone)]
pub struct MockBackend {
    script: Arc<Mutex<VecDeque<Result<String, ProviderError>>>>,
    /// Answer used once the script is exhausted
    fallback: Result<String, ProviderError>,
    attempts: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockBackend {
    /// Backend that answers every request with `response`
    pub fn always(response: impl Into<String>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Ok(response.into()),
            attempts: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Backend that fails every request with `error`
    pub fn always_failing(error: ProviderError) -> Self {
        let mut backend = Self::always("");
        backend.fallback = Err(error);
        backend
    }

    /// Queue answers consumed before the fallback
    pub fn then(self, response: Result<String, ProviderError>) -> Self {
        self.script.lock().push_back(response);
        self
    }

    /// Number of completion requests received
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Requests received, in order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    fn name(&self) -> &str {
        "MockBackend"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        let scripted = self.script.lock().pop_front();
        scripted.unwrap_or_else(|| self.fallback.clone())
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        self.fallback.as_ref().map(|_| ()).map_err(Clone::clone)
    }
}
