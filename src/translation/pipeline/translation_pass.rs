/*!
 * Translation pass for the content translation stage.
 *
 * Pending units are packed into token-bounded batches and dispatched with
 * the relevant glossary subset. Unit statuses, the ledger and the cache are
 * persisted after every batch, so an interrupted run resumes where it
 * stopped.
 */

use std::sync::Arc;

use anyhow::Result;
use log::{debug, info, warn};

use crate::project::{ProjectState, ProjectStore};
use crate::providers::Provider;
use crate::translation::batch::TokenBatcher;
use crate::translation::cache::TranslationCache;
use crate::translation::dispatcher::{DispatchConfig, Dispatcher};
use crate::translation::glossary::Glossary;
use crate::translation::ledger::FailureReason;
use crate::validation::Validator;

use super::orchestrator::{PipelineConfig, PipelineStage, StageConfig, StageReport, plan_batches};

/// Translation pass over the pending units of a project
pub struct TranslationPass {
    provider: Arc<dyn Provider>,
    cache: TranslationCache,
    stage: StageConfig,
    dispatch: DispatchConfig,
    skip_technical: bool,
    validator: Option<Validator>,
}

impl TranslationPass {
    pub fn new(provider: Arc<dyn Provider>, cache: TranslationCache, stage: StageConfig, config: &PipelineConfig) -> Self {
        let dispatch = DispatchConfig::new(&config.source_language, &config.target_language)
            .with_workers(stage.workers)
            .with_max_retries(stage.max_retries)
            .with_smart_glossary(config.smart_glossary, config.max_glossary_terms);

        Self {
            provider,
            cache,
            stage,
            dispatch,
            skip_technical: config.skip_technical,
            validator: None,
        }
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.dispatch = self.dispatch.with_context(context);
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Translate the pending units, or only the pending units among `only`.
    pub async fn run<P>(
        &self,
        state: &mut ProjectState,
        glossary: &Glossary,
        only: Option<&[String]>,
        store: &ProjectStore,
        on_progress: P,
    ) -> Result<StageReport>
    where
        P: Fn(usize, usize),
    {
        let mut report = StageReport::new(PipelineStage::Translate);

        if self.skip_technical {
            report.skipped = state.skip_technical();
        }

        let units = match only {
            Some(keys) => state.pending_units_among(keys),
            None => state.pending_units(),
        };
        if units.is_empty() {
            info!("No pending units to translate");
            store.save_state(state)?;
            return Ok(report);
        }

        let ledger = state.ledger();
        let batcher = TokenBatcher::new(self.stage.batch_tokens);
        let (batches, too_small) = plan_batches(&batcher, &units)?;

        for (key, error) in &too_small {
            ledger.record(key, FailureReason::ContextTooSmall, Some(error.clone()), 0);
            report.record_failure(key);
        }
        state.set_ledger(&ledger);
        store.save_state(state)?;

        info!(
            "Translating {} units in {} batches ({} workers, {} glossary terms)",
            units.len() - too_small.len(),
            batches.len(),
            self.stage.workers,
            glossary.len()
        );

        let total = batches.len();
        let mut completed = 0;
        on_progress(completed, total);

        let mut dispatcher = Dispatcher::new(
            self.provider.clone(),
            self.cache.clone(),
            ledger.clone(),
            self.dispatch.clone(),
        );
        if let Some(validator) = &self.validator {
            dispatcher = dispatcher.with_validator(validator.clone());
        }

        let dispatch = dispatcher
            .run(batches, glossary, |outcome| {
                let applied = state.apply_translations(&outcome.translations);
                state.set_ledger(&ledger);
                debug!(
                    "Batch {} done: {} applied, {} failed, {} from cache",
                    outcome.index, applied, outcome.failures.len(), outcome.cache_hits
                );

                if let Err(e) = self.cache.flush() {
                    warn!("Failed to flush translation cache: {}", e);
                }
                if let Err(e) = store.save_state(state) {
                    warn!("Failed to save project state: {}", e);
                }

                completed += 1;
                on_progress(completed, total);
            })
            .await;

        report.processed += dispatch.processed;
        report.successful += dispatch.successful;
        report.failed += dispatch.failed;
        report.failed_ids.extend(dispatch.failed_keys.iter().cloned());

        info!(
            "Translation finished: {} translated, {} failed, {} from cache, {} provider calls",
            report.successful, report.failed, dispatch.cache_hits, dispatch.provider_calls
        );
        Ok(report)
    }
}
