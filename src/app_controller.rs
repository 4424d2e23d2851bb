use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::project::{ImportSummary, ProjectStore};
use crate::providers::{self, Provider};
use crate::translation::ProgressStats;
use crate::translation::pipeline::{
    PipelineConfig, PipelineProgress, PipelineReport, PipelineStage, ProgressCallback, StageReport,
    TranslationPipeline,
};
use crate::validation::ValidationReport;

// @module: Application controller for project translation

/// Snapshot of a project for the `status` command
#[derive(Debug, Clone, Serialize)]
pub struct ProjectStatus {
    pub source_language: String,
    pub target_language: String,
    pub progress: ProgressStats,
    pub failed_units: usize,
    pub extracted_terms: usize,
    pub untranslated_terms: usize,
    pub failed_files: usize,
    pub failed_terms: usize,
    pub glossary_terms: usize,
    pub cached_translations: usize,
}

impl ProjectStatus {
    pub fn summary(&self) -> String {
        format!(
            "{} -> {} | {}/{} translated ({:.1}%), {} pending, {} skipped | {} failed units | \
             {} terms ({} untranslated), {} failed files, {} failed terms | {} glossary terms | {} cached",
            self.source_language,
            self.target_language,
            self.progress.translated,
            self.progress.total,
            self.progress.completion_rate(),
            self.progress.pending,
            self.progress.skipped,
            self.failed_units,
            self.extracted_terms,
            self.untranslated_terms,
            self.failed_files,
            self.failed_terms,
            self.glossary_terms,
            self.cached_translations
        )
    }
}

/// Main application controller for project translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    store: ProjectStore,
    // @field: Provider override, built from the config when unset
    provider: Option<Arc<dyn Provider>>,
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let store = ProjectStore::new(config.project_path());
        Ok(Self {
            config,
            store,
            provider: None,
            show_progress: true,
        })
    }

    /// Use the given provider instead of the configured one
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Disable the terminal progress bars
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    fn provider(&self) -> Result<Arc<dyn Provider>> {
        match &self.provider {
            Some(provider) => Ok(provider.clone()),
            None => providers::create_provider(&self.config),
        }
    }

    fn pipeline(&self) -> Result<TranslationPipeline> {
        if !self.store.is_initialized() {
            return Err(anyhow!(
                "No project found in {:?}, run `import` first",
                self.store.root()
            ));
        }

        let pipeline = TranslationPipeline::new(
            self.provider()?,
            self.store.clone(),
            PipelineConfig::from_config(&self.config),
        );

        if self.show_progress {
            Ok(pipeline.with_progress(progress_bars()))
        } else {
            Ok(pipeline)
        }
    }

    /// Import a flat `{key: text}` JSON map into the project.
    ///
    /// The project is created on first import. Existing translations given
    /// as another `{key: translation}` map fill pending units.
    pub fn import(
        &self,
        source: &Path,
        file: Option<&str>,
        translations: Option<&Path>,
        overwrite: bool,
    ) -> Result<ImportSummary> {
        let entries: BTreeMap<String, String> = FileManager::read_json(source)
            .with_context(|| format!("Failed to read source texts from {:?}", source))?;

        let mut state = if self.store.is_initialized() {
            self.store.load_state()?
        } else {
            info!("Creating project in {:?}", self.store.root());
            self.store
                .init(&self.config.source_language, &self.config.target_language)?
        };

        // A file name keeps extraction grouped per source file
        let file = file.map(str::to_string).or_else(|| {
            source
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
        });
        let summary = state.import_source_map(&entries, file.as_deref());
        info!(
            "Imported {:?}: {} new, {} updated, {} unchanged",
            source, summary.new, summary.updated, summary.unchanged
        );

        if let Some(path) = translations {
            let existing: BTreeMap<String, String> = FileManager::read_json(path)
                .with_context(|| format!("Failed to read translations from {:?}", path))?;
            let applied = state.import_translations(&existing, overwrite);
            info!("Applied {} existing translations from {:?}", applied, path);
        }

        self.store.save_state(&state)?;
        Ok(summary)
    }

    /// Run the full pipeline
    pub async fn run(&self) -> Result<PipelineReport> {
        self.config.validate().context("Configuration validation failed")?;
        let pipeline = self.pipeline()?;

        let provider = self.provider()?;
        if let Err(e) = provider.test_connection().await {
            warn!("Connection test for {} failed: {}", provider.name(), e);
        }

        let report = pipeline.run().await?;
        info!("Pipeline completed in {}", Self::format_duration(report.duration));
        for stage in report.stages() {
            if stage.failed > 0 {
                warn!(
                    "{} {} entries failed, run `retry-failed {}` to retry them",
                    stage.failed, stage.stage, stage.stage
                );
            }
        }
        Ok(report)
    }

    /// Retry the failed entries of one stage
    pub async fn retry_failed(&self, stage: PipelineStage) -> Result<StageReport> {
        self.config.validate().context("Configuration validation failed")?;
        self.pipeline()?.retry_failed(stage).await
    }

    /// Validate every translation without calling a provider
    pub fn validate(&self) -> Result<ValidationReport> {
        let state = self.store.load_state()?;
        let validator = PipelineConfig::from_config(&self.config).validator()?;
        let report = validator.validate_units(&state.units);

        for issue in report.issues.iter().filter(|issue| issue.is_error()) {
            warn!("{}", issue);
        }
        info!(
            "{}, quality {:.1} ({})",
            report.summary(),
            report.quality_score(),
            report.grade()
        );
        Ok(report)
    }

    /// Collect the project status
    pub fn status(&self) -> Result<ProjectStatus> {
        let state = self.store.load_state()?;
        let terms = self.store.load_terms()?;
        let glossary = self.store.load_glossary()?;
        let cache = self.store.open_cache()?;

        Ok(ProjectStatus {
            source_language: state.source_language.clone(),
            target_language: state.target_language.clone(),
            progress: state.progress(),
            failed_units: state.failed_units.len(),
            extracted_terms: terms.terms.len(),
            untranslated_terms: terms.untranslated().len(),
            failed_files: terms.failed_files.len(),
            failed_terms: terms.failed_terms.len(),
            glossary_terms: glossary.len(),
            cached_translations: cache.len(),
        })
    }

    /// Write the translated units as a flat `{key: translation}` JSON map
    pub fn export(&self, output: &Path) -> Result<usize> {
        let translations = self.store.load_state()?.translations();
        FileManager::write_json_atomic(output, &translations)
            .with_context(|| format!("Failed to write translations to {:?}", output))?;
        info!("Exported {} translations to {:?}", translations.len(), output);
        Ok(translations.len())
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

/// Progress callback drawing one bar per stage
fn progress_bars() -> ProgressCallback {
    let current: Mutex<Option<(PipelineStage, ProgressBar)>> = Mutex::new(None);

    Arc::new(move |progress: PipelineProgress| {
        let mut current = current.lock();

        let same_stage = matches!(&*current, Some((stage, _)) if *stage == progress.stage);
        if !same_stage {
            if let Some((_, bar)) = current.take() {
                bar.finish();
            }
            *current = Some((progress.stage, stage_bar(progress.stage, progress.total)));
        }

        if let Some((_, bar)) = current.as_ref() {
            bar.set_length(progress.total as u64);
            bar.set_position(progress.completed as u64);
            if progress.completed >= progress.total {
                bar.finish();
            }
        }
    })
}

fn stage_bar(stage: PipelineStage, total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg} {eta}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style.progress_chars("█▓▒░"));
    bar.set_message(stage.to_string());
    bar
}
