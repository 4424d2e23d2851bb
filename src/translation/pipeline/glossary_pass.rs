/*!
 * Glossary pass for the glossary translation stage.
 *
 * Untranslated extracted terms are batched by token budget and translated.
 * Terms the provider skipped or failed on land in the `failed_terms`
 * ledger. With the identity fallback enabled such a term is stored as its
 * own translation, but it stays in the ledger and out of the glossary.
 */

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};

use crate::errors::ProviderError;
use crate::project::ExtractedTerms;
use crate::providers::{CallOptions, Provider};
use crate::translation::batch::{Batch, TokenBatcher};
use crate::translation::concurrency::run_as_completed;
use crate::translation::ledger::FailureReason;

use super::orchestrator::{PipelineStage, StageConfig, StageReport, plan_batches};

/// Glossary pass over the extracted terms of a project
pub struct GlossaryPass {
    provider: Arc<dyn Provider>,
    stage: StageConfig,
    source_language: String,
    target_language: String,
    context: Option<String>,
    identity_fallback: bool,
}

impl GlossaryPass {
    pub fn new(provider: Arc<dyn Provider>, stage: StageConfig, source_language: &str, target_language: &str) -> Self {
        Self {
            provider,
            stage,
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            context: None,
            identity_fallback: false,
        }
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn with_identity_fallback(mut self, enabled: bool) -> Self {
        self.identity_fallback = enabled;
        self
    }

    /// Translate the untranslated terms, or exactly the terms in `only`.
    pub async fn run<P>(
        &self,
        terms: &mut ExtractedTerms,
        only: Option<&[String]>,
        on_progress: P,
    ) -> Result<StageReport>
    where
        P: Fn(usize, usize),
    {
        let mut report = StageReport::new(PipelineStage::Glossary);
        let ledger = terms.glossary_ledger();

        let candidates: Vec<String> = match only {
            Some(ids) => ids.iter().filter(|id| terms.terms.contains_key(*id)).cloned().collect(),
            None => terms.untranslated(),
        };
        if candidates.is_empty() {
            info!("No glossary terms to translate");
            return Ok(report);
        }

        let batcher = TokenBatcher::new(self.stage.batch_tokens);
        let (batches, too_small) = plan_batches(&batcher, &candidates)?;
        for (term, error) in &too_small {
            ledger.record(term, FailureReason::ContextTooSmall, Some(error.clone()), 0);
            report.record_failure(term);
        }

        info!(
            "Translating {} glossary terms in {} batches ({} workers)",
            candidates.len() - too_small.len(),
            batches.len(),
            self.stage.workers
        );

        let batch_terms: Vec<Vec<String>> = batches.iter().map(|b| b.items.clone()).collect();
        let total = batches.len();
        let mut completed = 0;
        on_progress(completed, total);

        let job = |batch: Batch<String>| {
            let provider = self.provider.clone();
            let source_language = self.source_language.clone();
            let target_language = self.target_language.clone();
            let options = CallOptions::with_max_retries(self.stage.max_retries).context(self.context.clone());
            async move {
                provider
                    .translate_glossary(&batch.items, &source_language, &target_language, &options)
                    .await
            }
        };

        run_as_completed(batches, self.stage.workers, job, |position, result| {
            let batch = &batch_terms[position];
            let (translations, failure): (HashMap<String, String>, Option<(String, u32)>) = match result {
                Ok(Ok(translations)) => (translations, None),
                Ok(Err(e)) => {
                    warn!("Glossary batch {} failed: {}", position, e);
                    (HashMap::new(), Some(failure_details(&e)))
                }
                Err(e) => (HashMap::new(), Some((e.to_string(), 0))),
            };

            for term in batch {
                match translations.get(term) {
                    Some(translation) => {
                        terms.set_translation(term, translation);
                        ledger.clear(term);
                        report.record_success();
                    }
                    None => {
                        let (error, attempts) = failure
                            .clone()
                            .unwrap_or_else(|| ("Provider returned no translation".to_string(), 1));
                        ledger.record(term, FailureReason::ProcessingError, Some(error), attempts);
                        if self.identity_fallback {
                            terms.set_translation(term, term);
                        }
                        report.record_failure(term);
                    }
                }
            }

            completed += 1;
            on_progress(completed, total);
        })
        .await;

        terms.set_glossary_ledger(&ledger);
        info!(
            "Glossary translation finished: {} translated, {} failed",
            report.successful, report.failed
        );
        Ok(report)
    }
}

fn failure_details(error: &ProviderError) -> (String, u32) {
    (error.to_string(), error.attempts())
}
