/*!
 * Pipeline orchestrator for coordinating translation stages.
 *
 * The orchestrator runs the three-stage pipeline over a project:
 * 1. Extract: terms are extracted from the source texts, per file
 * 2. Glossary: extracted terms are translated and merged into the glossary
 * 3. Translate: pending units are translated with the glossary
 *
 * Every stage persists after each batch, records exhausted items in its
 * failure ledger and can be rerun restricted to that ledger.
 */

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use crate::app_config::{Config, StageSettings};
use crate::errors::TranslationError;
use crate::project::ProjectStore;
use crate::providers::Provider;
use crate::translation::batch::{Batch, BatchItem, TokenBatcher};
use crate::translation::concurrency::ProviderProfile;
use crate::translation::ledger::FailureReason;
use crate::translation::unit::ProgressStats;
use crate::validation::{CustomPattern, ValidationIssue, ValidationReport, Validator};

use super::extract_pass::ExtractPass;
use super::glossary_pass::GlossaryPass;
use super::translation_pass::TranslationPass;

/// Settings of a single stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageConfig {
    /// Batches in flight at once
    pub workers: usize,
    /// Token budget per batch, prompt overhead included
    pub batch_tokens: usize,
    /// Attempt budget per provider call
    pub max_retries: u32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            batch_tokens: 4000,
            max_retries: 3,
        }
    }
}

impl StageConfig {
    fn from_settings(settings: &StageSettings, profile: &ProviderProfile, default_retries: u32) -> Self {
        Self {
            workers: profile.effective_concurrent_requests(settings.threads),
            batch_tokens: settings.batch_tokens,
            max_retries: settings.max_retries.unwrap_or(default_retries),
        }
    }

    /// The same stage with a different attempt budget
    pub fn with_max_retries(&self, max_retries: u32) -> Self {
        Self {
            max_retries,
            ..self.clone()
        }
    }
}

/// Configuration for the translation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source_language: String,
    pub target_language: String,
    pub extract: StageConfig,
    pub glossary: StageConfig,
    pub translate: StageConfig,
    pub skip_extract: bool,
    pub skip_glossary: bool,
    pub smart_glossary: bool,
    pub max_glossary_terms: Option<usize>,
    pub strict_validation: bool,
    pub revalidate: bool,
    pub skip_technical: bool,
    pub glossary_identity_fallback: bool,
    /// Attempt budget of retry-failed passes
    pub retry_failed_max_retries: u32,
    /// Project context; `PROJECT_CONTEXT.md` is used when unset
    pub context: Option<String>,
    /// JSON file with extra markup patterns to validate
    pub custom_patterns: Option<PathBuf>,
}

impl PipelineConfig {
    /// Create a new pipeline configuration.
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            extract: StageConfig::default(),
            glossary: StageConfig::default(),
            translate: StageConfig::default(),
            skip_extract: false,
            skip_glossary: false,
            smart_glossary: true,
            max_glossary_terms: None,
            strict_validation: false,
            revalidate: true,
            skip_technical: true,
            glossary_identity_fallback: false,
            retry_failed_max_retries: 10,
            context: None,
            custom_patterns: None,
        }
    }

    /// Build from the application configuration
    pub fn from_config(config: &Config) -> Self {
        let profile = ProviderProfile::for_provider(config.translation.provider);
        let retries = config.translation.common.retry_count;
        let pipeline = &config.pipeline;

        Self {
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            extract: StageConfig::from_settings(&pipeline.extract, &profile, retries),
            glossary: StageConfig::from_settings(&pipeline.glossary, &profile, retries),
            translate: StageConfig::from_settings(&pipeline.translate, &profile, retries),
            skip_extract: pipeline.skip_extract,
            skip_glossary: pipeline.skip_glossary,
            smart_glossary: pipeline.smart_glossary,
            max_glossary_terms: pipeline.max_glossary_terms,
            strict_validation: pipeline.strict_validation,
            revalidate: pipeline.revalidate,
            skip_technical: pipeline.skip_technical,
            glossary_identity_fallback: pipeline.glossary_identity_fallback,
            retry_failed_max_retries: pipeline.retry_failed_max_retries,
            context: None,
            custom_patterns: pipeline.custom_patterns.as_ref().map(PathBuf::from),
        }
    }

    /// Skip the extraction and glossary stages.
    pub fn with_skips(mut self, skip_extract: bool, skip_glossary: bool) -> Self {
        self.skip_extract = skip_extract;
        self.skip_glossary = skip_glossary;
        self
    }

    /// Use the same worker count for every stage.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.extract.workers = workers;
        self.glossary.workers = workers;
        self.translate.workers = workers;
        self
    }

    /// Use the same token budget for every stage.
    pub fn with_batch_tokens(mut self, batch_tokens: usize) -> Self {
        self.extract.batch_tokens = batch_tokens;
        self.glossary.batch_tokens = batch_tokens;
        self.translate.batch_tokens = batch_tokens;
        self
    }

    /// Use the same attempt budget for every stage.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.extract.max_retries = max_retries;
        self.glossary.max_retries = max_retries;
        self.translate.max_retries = max_retries;
        self
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn with_skip_technical(mut self, enabled: bool) -> Self {
        self.skip_technical = enabled;
        self
    }

    pub fn with_identity_fallback(mut self, enabled: bool) -> Self {
        self.glossary_identity_fallback = enabled;
        self
    }

    pub fn with_strict_validation(mut self, enabled: bool) -> Self {
        self.strict_validation = enabled;
        self
    }

    pub fn with_custom_patterns(mut self, path: Option<PathBuf>) -> Self {
        self.custom_patterns = path;
        self
    }

    /// Validator for these settings, custom patterns loaded
    pub fn validator(&self) -> Result<Validator> {
        let validator = Validator::new(self.strict_validation);
        match &self.custom_patterns {
            Some(path) => Ok(validator.with_custom_patterns(CustomPattern::load_json(path)?)),
            None => Ok(validator),
        }
    }
}

/// Stages of the translation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Extract,
    Glossary,
    Translate,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extract => write!(f, "extract"),
            Self::Glossary => write!(f, "glossary"),
            Self::Translate => write!(f, "translate"),
        }
    }
}

impl std::str::FromStr for PipelineStage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "extract" => Ok(Self::Extract),
            "glossary" => Ok(Self::Glossary),
            "translate" => Ok(Self::Translate),
            _ => Err(anyhow::anyhow!("Invalid pipeline stage: {}", s)),
        }
    }
}

/// Progress information during pipeline execution.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineProgress {
    pub stage: PipelineStage,
    /// Batches finished in the current stage
    pub completed: usize,
    /// Batches planned for the current stage
    pub total: usize,
}

impl PipelineProgress {
    /// Progress within the stage (0.0 - 1.0)
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f32 / self.total as f32
    }
}

/// Callback receiving progress updates
pub type ProgressCallback = Arc<dyn Fn(PipelineProgress) + Send + Sync>;

/// Outcome of one stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: PipelineStage,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Ids left in the ledger by this run
    pub failed_ids: Vec<String>,
}

impl StageReport {
    pub fn new(stage: PipelineStage) -> Self {
        Self {
            stage,
            processed: 0,
            successful: 0,
            failed: 0,
            skipped: 0,
            failed_ids: Vec::new(),
        }
    }

    pub(crate) fn record_failure(&mut self, id: &str) {
        self.processed += 1;
        self.failed += 1;
        self.failed_ids.push(id.to_string());
    }

    pub(crate) fn record_success(&mut self) {
        self.processed += 1;
        self.successful += 1;
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} processed, {} successful, {} failed, {} skipped",
            self.stage, self.processed, self.successful, self.failed, self.skipped
        )
    }
}

/// Result of the complete pipeline execution.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Extraction report, `None` when skipped
    pub extract: Option<StageReport>,
    /// Glossary report, `None` when skipped
    pub glossary: Option<StageReport>,
    pub translate: StageReport,
    /// Validation of the whole project after translation
    pub validation: ValidationReport,
    /// Keys sent back to pending by revalidation
    pub downgraded: Vec<String>,
    pub progress: ProgressStats,
    pub duration: Duration,
}

impl PipelineReport {
    pub fn stages(&self) -> Vec<&StageReport> {
        [self.extract.as_ref(), self.glossary.as_ref(), Some(&self.translate)]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Get a summary of the pipeline result.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("Duration: {:.2}s", self.duration.as_secs_f32())];
        parts.extend(self.stages().iter().map(|stage| stage.summary()));
        parts.push(format!(
            "Completion: {:.1}% ({}/{})",
            self.progress.completion_rate(),
            self.progress.translated,
            self.progress.total
        ));
        parts.push(format!(
            "Quality: {:.1} ({})",
            self.validation.quality_score(),
            self.validation.grade()
        ));
        parts.join(" | ")
    }
}

/// Plan batches, setting aside items too large for any batch.
///
/// Returns the batches and the `(key, error)` pairs of the items that did
/// not fit. Batch indices are contiguous across the whole plan.
pub(crate) fn plan_batches<T: BatchItem + Clone>(
    batcher: &TokenBatcher,
    items: &[T],
) -> Result<(Vec<Batch<T>>, Vec<(String, String)>), TranslationError> {
    let mut batches: Vec<Batch<T>> = Vec::new();
    let mut too_small = Vec::new();
    let mut remaining = items;

    while !remaining.is_empty() {
        match batcher.batch(remaining) {
            Ok(plan) => {
                let offset = batches.len();
                batches.extend(plan.batches.into_iter().map(|mut batch| {
                    batch.index += offset;
                    batch
                }));
                break;
            }
            Err(e @ TranslationError::ContextTooSmall { .. }) => {
                warn!("{}", e);
                too_small.push((remaining[0].batch_key().to_string(), e.to_string()));
                remaining = &remaining[1..];
            }
            Err(e) => return Err(e),
        }
    }

    Ok((batches, too_small))
}

/// The main translation pipeline orchestrator.
pub struct TranslationPipeline {
    provider: Arc<dyn Provider>,
    store: ProjectStore,
    config: PipelineConfig,
    progress_callback: Option<ProgressCallback>,
}

impl TranslationPipeline {
    /// Create a new pipeline over a project directory.
    pub fn new(provider: Arc<dyn Provider>, store: ProjectStore, config: PipelineConfig) -> Self {
        Self {
            provider,
            store,
            config,
            progress_callback: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Get the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    fn progress_reporter(&self, stage: PipelineStage) -> impl Fn(usize, usize) + Send + Sync + 'static {
        let callback = self.progress_callback.clone();
        move |completed, total| {
            if let Some(callback) = &callback {
                callback(PipelineProgress { stage, completed, total });
            }
        }
    }

    fn context(&self) -> Result<Option<String>> {
        match &self.config.context {
            Some(context) => Ok(Some(context.clone())),
            None => self.store.load_context(),
        }
    }

    /// Run every enabled stage.
    pub async fn run(&self) -> Result<PipelineReport> {
        let start_time = Instant::now();
        let context = self.context()?;

        let extract = if self.config.skip_extract {
            info!("Stage 1: skipped, using existing extracted terms");
            None
        } else {
            info!("Stage 1: extracting terms");
            Some(self.run_extract(&self.config.extract, context.as_deref(), None).await?)
        };

        let glossary = if self.config.skip_glossary {
            info!("Stage 2: skipped, using existing glossary");
            None
        } else {
            info!("Stage 2: translating glossary");
            Some(self.run_glossary(&self.config.glossary, context.as_deref(), None).await?)
        };

        info!("Stage 3: translating content");
        let translate = self.run_translate(&self.config.translate, context.as_deref(), None).await?;

        let (validation, downgraded) = self.validate_project()?;
        let progress = self.store.load_state()?.progress();

        let report = PipelineReport {
            extract,
            glossary,
            translate,
            validation,
            downgraded,
            progress,
            duration: start_time.elapsed(),
        };
        info!("{}", report.summary());
        Ok(report)
    }

    /// Rerun one stage for the retryable entries of its ledger only.
    pub async fn retry_failed(&self, stage: PipelineStage) -> Result<StageReport> {
        let context = self.context()?;
        let max_retries = self.config.retry_failed_max_retries;

        let ids = match stage {
            PipelineStage::Extract => self.store.load_terms()?.extraction_ledger().retryable_ids(),
            PipelineStage::Glossary => self.store.load_terms()?.glossary_ledger().retryable_ids(),
            PipelineStage::Translate => self.store.load_state()?.ledger().retryable_ids(),
        };

        if ids.is_empty() {
            info!("No failed {} entries to retry", stage);
            return Ok(StageReport::new(stage));
        }
        info!("Retrying {} failed {} entries with {} attempts each", ids.len(), stage, max_retries);

        let report = match stage {
            PipelineStage::Extract => {
                self.run_extract(&self.config.extract.with_max_retries(max_retries), context.as_deref(), Some(&ids))
                    .await?
            }
            PipelineStage::Glossary => {
                self.run_glossary(&self.config.glossary.with_max_retries(max_retries), context.as_deref(), Some(&ids))
                    .await?
            }
            PipelineStage::Translate => {
                let report = self
                    .run_translate(&self.config.translate.with_max_retries(max_retries), context.as_deref(), Some(&ids))
                    .await?;
                self.validate_project()?;
                report
            }
        };

        info!("{}", report.summary());
        Ok(report)
    }

    async fn run_extract(&self, stage: &StageConfig, context: Option<&str>, only: Option<&[String]>) -> Result<StageReport> {
        let state = self.store.load_state()?;
        let mut terms = self.store.load_terms()?;

        let pass = ExtractPass::new(self.provider.clone(), stage.clone(), context.map(str::to_string));
        let report = pass
            .run(&state.units, &mut terms, only, self.progress_reporter(PipelineStage::Extract))
            .await?;

        self.store.save_terms(&terms).context("Failed to save extracted terms")?;
        Ok(report)
    }

    async fn run_glossary(&self, stage: &StageConfig, context: Option<&str>, only: Option<&[String]>) -> Result<StageReport> {
        let mut terms = self.store.load_terms()?;

        let pass = GlossaryPass::new(
            self.provider.clone(),
            stage.clone(),
            &self.config.source_language,
            &self.config.target_language,
        )
        .with_context(context.map(str::to_string))
        .with_identity_fallback(self.config.glossary_identity_fallback);

        let report = pass
            .run(&mut terms, only, self.progress_reporter(PipelineStage::Glossary))
            .await?;
        self.store.save_terms(&terms).context("Failed to save extracted terms")?;

        // Failed terms stay out of the glossary even with an identity fallback
        let failed: BTreeSet<String> = terms.failed_terms.iter().map(|r| r.id.clone()).collect();
        let translated = terms
            .glossary()
            .iter()
            .filter(|(term, _)| !failed.contains(*term))
            .map(|(term, translation)| (term.clone(), translation.clone()))
            .collect();

        let mut glossary = self.store.load_glossary()?;
        let added = glossary.merge(&translated);
        self.store.save_glossary(&glossary).context("Failed to save glossary")?;
        info!("Added {} terms to the glossary ({} total)", added, glossary.len());

        Ok(report)
    }

    async fn run_translate(&self, stage: &StageConfig, context: Option<&str>, only: Option<&[String]>) -> Result<StageReport> {
        let validator = self.config.validator()?;
        let mut state = self.store.load_state()?;
        let glossary = self.store.load_glossary()?;
        let cache = self.store.open_cache()?;

        let pass = TranslationPass::new(self.provider.clone(), cache.clone(), stage.clone(), &self.config)
            .with_context(context.map(str::to_string))
            .with_validator(validator);

        let result = pass
            .run(&mut state, &glossary, only, &self.store, self.progress_reporter(PipelineStage::Translate))
            .await;

        cache.close().context("Failed to write translation cache")?;
        self.store.save_state(&state).context("Failed to save project state")?;
        result
    }

    /// Validate every unit, downgrading failing translations when enabled.
    pub fn validate_project(&self) -> Result<(ValidationReport, Vec<String>)> {
        let mut state = self.store.load_state()?;
        let validator = self.config.validator()?;

        let mut downgraded = Vec::new();
        if self.config.revalidate {
            downgraded = validator.revalidate(&mut state.units);
            if !downgraded.is_empty() {
                let ledger = state.ledger();
                for key in &downgraded {
                    let messages: Vec<String> = state
                        .unit(key)
                        .and_then(|unit| validator.validate_unit(unit))
                        .unwrap_or_default()
                        .iter()
                        .filter(|issue| issue.is_error())
                        .map(ValidationIssue::to_string)
                        .collect();
                    ledger.record(
                        key,
                        FailureReason::ProcessingError,
                        Some(format!("Validation failed: {}", messages.join("; "))),
                        0,
                    );
                }
                state.set_ledger(&ledger);
                self.store.save_state(&state)?;
            }
        }

        let report = validator.validate_units(&state.units);
        info!(
            "{}, quality {:.1} ({})",
            report.summary(),
            report.quality_score(),
            report.grade()
        );
        Ok((report, downgraded))
    }
}
