/*!
 * Concurrent batch dispatcher.
 *
 * Sends translation batches to a provider through the bounded worker pool.
 * Each unit is looked up in the cache first; only misses reach the
 * provider, deduplicated by cache key within a batch. Provider results
 * must pass the validator's error-level checks before they are cached, and
 * cached entries that no longer pass are evicted and translated again.
 * Results are merged back by unit key and failures land in the failure
 * ledger.
 */

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::providers::{CallOptions, Provider};
use crate::validation::Validator;
use super::batch::Batch;
use super::cache::{TranslationCache, cache_key};
use super::concurrency::run_as_completed;
use super::glossary::{Glossary, GlossaryMatcher};
use super::ledger::{FailureLedger, FailureReason};
use super::unit::TranslationUnit;

/// Settings for one dispatch run
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub source_language: String,
    pub target_language: String,
    /// Batches in flight at once
    pub workers: usize,
    /// Attempt budget per provider call
    pub max_retries: u32,
    /// Project context passed to the provider
    pub context: Option<String>,
    /// Send only the glossary terms relevant to each batch
    pub smart_glossary: bool,
    /// Cap on glossary terms per batch
    pub max_glossary_terms: Option<usize>,
}

impl DispatchConfig {
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            workers: 1,
            max_retries: 3,
            context: None,
            smart_glossary: true,
            max_glossary_terms: None,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn with_smart_glossary(mut self, enabled: bool, max_terms: Option<usize>) -> Self {
        self.smart_glossary = enabled;
        self.max_glossary_terms = max_terms;
        self
    }
}

/// A unit the provider could not translate
#[derive(Debug, Clone, PartialEq)]
pub struct UnitFailure {
    pub key: String,
    pub error: String,
    /// Provider attempts consumed by a failed call. A delivered answer that
    /// is rejected (missing or invalid) counts as a single dispatch.
    pub attempts: u32,
}

/// Result of one batch, handed to the caller as soon as it completes
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Position of the batch in the plan
    pub index: usize,
    /// Accepted translations by unit key, cache hits included
    pub translations: HashMap<String, String>,
    pub failures: Vec<UnitFailure>,
    pub cache_hits: usize,
    /// Whether the provider was called at all
    pub provider_called: bool,
}

/// Totals of a dispatch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub batches: usize,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub cache_hits: usize,
    pub provider_calls: usize,
    pub failed_keys: Vec<String>,
}

impl DispatchReport {
    fn absorb(&mut self, outcome: &BatchOutcome) {
        self.batches += 1;
        self.successful += outcome.translations.len();
        self.failed += outcome.failures.len();
        self.processed += outcome.translations.len() + outcome.failures.len();
        self.cache_hits += outcome.cache_hits;
        if outcome.provider_called {
            self.provider_calls += 1;
        }
        self.failed_keys.extend(outcome.failures.iter().map(|f| f.key.clone()));
    }
}

/// Texts sharing one cache key within a batch
struct MissGroup {
    cache_key: String,
    text: String,
    unit_keys: Vec<String>,
}

/// Concurrent translation dispatcher
pub struct Dispatcher {
    provider: Arc<dyn Provider>,
    cache: TranslationCache,
    ledger: FailureLedger,
    config: DispatchConfig,
    validator: Option<Arc<Validator>>,
}

impl Dispatcher {
    pub fn new(
        provider: Arc<dyn Provider>,
        cache: TranslationCache,
        ledger: FailureLedger,
        config: DispatchConfig,
    ) -> Self {
        Self { provider, cache, ledger, config, validator: None }
    }

    /// Reject provider results and cached entries with validation errors
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Translate every batch. `on_batch` runs after each batch completes,
    /// once the cache and the ledger reflect its results.
    pub async fn run<F>(&self, batches: Vec<Batch<TranslationUnit>>, glossary: &Glossary, mut on_batch: F) -> DispatchReport
    where
        F: FnMut(&BatchOutcome),
    {
        let mut report = DispatchReport::default();
        if batches.is_empty() {
            return report;
        }

        let glossary = Arc::new(glossary.clone());
        let glossary_hash = Arc::new(glossary.content_hash());
        let batch_keys: Vec<(usize, Vec<String>)> = batches.iter().map(|b| (b.index, b.keys())).collect();

        info!(
            "Dispatching {} batches with {} workers via {}",
            batches.len(), self.config.workers, self.provider.name()
        );

        let job = |batch: Batch<TranslationUnit>| {
            let provider = self.provider.clone();
            let cache = self.cache.clone();
            let config = self.config.clone();
            let glossary = glossary.clone();
            let glossary_hash = glossary_hash.clone();
            let validator = self.validator.clone();
            async move { translate_batch(provider, cache, config, validator, glossary, glossary_hash, batch).await }
        };

        run_as_completed(batches, self.config.workers, job, |position, result| {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    let (index, keys) = &batch_keys[position];
                    BatchOutcome {
                        index: *index,
                        failures: keys
                            .iter()
                            .map(|key| UnitFailure {
                                key: key.clone(),
                                error: format!("Worker task failed: {}", e),
                                attempts: 0,
                            })
                            .collect(),
                        ..BatchOutcome::default()
                    }
                }
            };

            for key in outcome.translations.keys() {
                self.ledger.clear(key);
            }
            for failure in &outcome.failures {
                self.ledger.record(
                    &failure.key,
                    FailureReason::ProcessingError,
                    Some(failure.error.clone()),
                    failure.attempts,
                );
            }

            report.absorb(&outcome);
            on_batch(&outcome);
        })
        .await;

        info!(
            "Dispatch finished: {} successful, {} failed, {} cache hits, {} provider calls",
            report.successful, report.failed, report.cache_hits, report.provider_calls
        );
        report
    }
}

async fn translate_batch(
    provider: Arc<dyn Provider>,
    cache: TranslationCache,
    config: DispatchConfig,
    validator: Option<Arc<Validator>>,
    glossary: Arc<Glossary>,
    glossary_hash: Arc<String>,
    batch: Batch<TranslationUnit>,
) -> BatchOutcome {
    let mut outcome = BatchOutcome {
        index: batch.index,
        ..BatchOutcome::default()
    };

    let mut groups: Vec<MissGroup> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();

    for unit in &batch.items {
        let key = cache_key(&unit.original_text, &config.source_language, &config.target_language, &glossary_hash);
        if let Some(hit) = cache.get_by_key(&key, &unit.original_text) {
            match validation_errors(validator.as_deref(), &unit.key, &unit.original_text, &hit) {
                None => {
                    outcome.translations.insert(unit.key.clone(), hit);
                    outcome.cache_hits += 1;
                    continue;
                }
                Some(error) => {
                    debug!("Evicting cached translation of '{}': {}", unit.key, error);
                    cache.evict(&key);
                }
            }
        }

        match group_index.get(&key) {
            Some(&position) => groups[position].unit_keys.push(unit.key.clone()),
            None => {
                group_index.insert(key.clone(), groups.len());
                groups.push(MissGroup {
                    cache_key: key,
                    text: unit.original_text.clone(),
                    unit_keys: vec![unit.key.clone()],
                });
            }
        }
    }

    if groups.is_empty() {
        debug!("Batch {} fully served from cache", batch.index);
        return outcome;
    }

    let texts: Vec<String> = groups.iter().map(|g| g.text.clone()).collect();
    let batch_glossary = if config.smart_glossary {
        GlossaryMatcher::new(&glossary).relevant_limited(&texts, config.max_glossary_terms)
    } else {
        (*glossary).clone()
    };

    let options = CallOptions::with_max_retries(config.max_retries).context(config.context.clone());
    outcome.provider_called = true;

    match provider
        .translate(&texts, &config.source_language, &config.target_language, &batch_glossary, &options)
        .await
    {
        Ok(results) => {
            if results.len() < groups.len() {
                warn!(
                    "Batch {}: provider returned {} of {} translations, padding the rest",
                    batch.index, results.len(), groups.len()
                );
            }

            for (position, group) in groups.into_iter().enumerate() {
                let accepted = match results.get(position).filter(|t| !t.trim().is_empty()) {
                    Some(translation) => match validation_errors(validator.as_deref(), &group.unit_keys[0], &group.text, translation) {
                        Some(error) => Err(error),
                        None => Ok(translation),
                    },
                    None => Err("Provider returned no translation".to_string()),
                };

                match accepted {
                    Ok(translation) => {
                        cache.put_by_key(group.cache_key, translation);
                        for key in group.unit_keys {
                            outcome.translations.insert(key, translation.clone());
                        }
                    }
                    Err(error) => {
                        debug!("Batch {}: rejected '{}': {}", batch.index, group.unit_keys[0], error);
                        for key in group.unit_keys {
                            outcome.failures.push(UnitFailure {
                                key,
                                error: error.clone(),
                                attempts: 1,
                            });
                        }
                    }
                }
            }
        }
        Err(e) => {
            warn!("Batch {} failed: {}", batch.index, e);
            let attempts = e.attempts();
            let error = e.to_string();
            for group in groups {
                for key in group.unit_keys {
                    outcome.failures.push(UnitFailure {
                        key,
                        error: error.clone(),
                        attempts,
                    });
                }
            }
        }
    }

    outcome
}

/// Joined validation errors of a translation, `None` when it is acceptable
fn validation_errors(validator: Option<&Validator>, key: &str, source: &str, translation: &str) -> Option<String> {
    let issues = validator?.translation_errors(key, source, translation);
    if issues.is_empty() {
        return None;
    }
    let messages: Vec<String> = issues.iter().map(|issue| issue.to_string()).collect();
    Some(format!("Validation failed: {}", messages.join("; ")))
}
