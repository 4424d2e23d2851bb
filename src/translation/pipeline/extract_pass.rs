/*!
 * Extraction pass for the term extraction stage.
 *
 * Source texts are grouped by their file and each file is split into
 * token-bounded chunks. Failures are tracked per file: a file whose chunk
 * exhausted its retries lands in the `failed_files` ledger and is retried
 * as a whole.
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use log::{debug, info, warn};

use crate::errors::ProviderError;
use crate::project::ExtractedTerms;
use crate::providers::{CallOptions, Provider};
use crate::translation::batch::TokenBatcher;
use crate::translation::concurrency::run_as_completed;
use crate::translation::ledger::FailureReason;
use crate::translation::unit::TranslationUnit;

use super::orchestrator::{PipelineStage, StageConfig, StageReport, plan_batches};

/// File name used for units imported without one
pub const UNASSIGNED_FILE: &str = "unassigned";

/// One provider request: a chunk of a single file
struct Chunk {
    file: String,
    text: String,
}

#[derive(Default)]
struct FileOutcome {
    terms: Vec<String>,
    failure: Option<(FailureReason, String, u32)>,
}

impl FileOutcome {
    /// Keep the first failure, but let a retryable one replace a permanent one
    fn fail(&mut self, reason: FailureReason, error: String, attempts: u32) {
        let replace = match &self.failure {
            None => true,
            Some((existing, _, _)) => !existing.is_retryable() && reason.is_retryable(),
        };
        if replace {
            self.failure = Some((reason, error, attempts));
        }
    }
}

/// Extraction pass over the source texts of a project
pub struct ExtractPass {
    provider: Arc<dyn Provider>,
    stage: StageConfig,
    context: Option<String>,
}

impl ExtractPass {
    pub fn new(provider: Arc<dyn Provider>, stage: StageConfig, context: Option<String>) -> Self {
        Self { provider, stage, context }
    }

    fn file_context(&self, file: &str) -> String {
        match &self.context {
            Some(context) => format!("Video game localization file: {}\n{}", file, context),
            None => format!("Video game localization file: {}", file),
        }
    }

    /// Extract terms from every file, or only from the files in `only`.
    pub async fn run<P>(
        &self,
        units: &[TranslationUnit],
        terms: &mut ExtractedTerms,
        only: Option<&[String]>,
        on_progress: P,
    ) -> Result<StageReport>
    where
        P: Fn(usize, usize),
    {
        let mut report = StageReport::new(PipelineStage::Extract);
        let ledger = terms.extraction_ledger();

        let mut files: BTreeMap<String, Vec<TranslationUnit>> = BTreeMap::new();
        for unit in units.iter().filter(|u| !u.original_text.trim().is_empty()) {
            let file = unit.file.clone().unwrap_or_else(|| UNASSIGNED_FILE.to_string());
            if only.is_some_and(|only| !only.contains(&file)) {
                continue;
            }
            files.entry(file).or_default().push(unit.clone());
        }

        let batcher = TokenBatcher::new(self.stage.batch_tokens);
        let mut outcomes: BTreeMap<String, FileOutcome> = BTreeMap::new();
        let mut chunks = Vec::new();

        for (file, file_units) in &files {
            let outcome = outcomes.entry(file.clone()).or_default();
            let (batches, too_small) = plan_batches(&batcher, file_units)?;
            for (key, error) in too_small {
                outcome.fail(FailureReason::ContextTooSmall, format!("{}: {}", key, error), 0);
            }
            for batch in batches {
                let text: Vec<&str> = batch.items.iter().map(|u| u.original_text.as_str()).collect();
                chunks.push(Chunk {
                    file: file.clone(),
                    text: text.join("\n"),
                });
            }
        }

        info!(
            "Extracting terms from {} files in {} chunks ({} workers)",
            files.len(),
            chunks.len(),
            self.stage.workers
        );

        let chunk_files: Vec<String> = chunks.iter().map(|c| c.file.clone()).collect();
        let total = chunks.len();
        let mut completed = 0;
        on_progress(completed, total);

        let job = |chunk: Chunk| {
            let provider = self.provider.clone();
            let options = CallOptions::with_max_retries(self.stage.max_retries)
                .context(Some(self.file_context(&chunk.file)));
            async move { provider.extract_terms(&chunk.text, &options).await }
        };

        run_as_completed(chunks, self.stage.workers, job, |position, result| {
            let file = &chunk_files[position];
            let outcome = outcomes.entry(file.clone()).or_default();

            match result {
                Ok(Ok(found)) => {
                    debug!("{}: {} terms", file, found.len());
                    outcome.terms.extend(found);
                }
                Ok(Err(e)) => {
                    warn!("Term extraction failed for {}: {}", file, e);
                    let reason = match e {
                        ProviderError::RetriesExhausted { .. } => FailureReason::ExtractionFailed,
                        _ => FailureReason::ProcessingError,
                    };
                    outcome.fail(reason, e.to_string(), e.attempts());
                }
                Err(e) => outcome.fail(FailureReason::ProcessingError, e.to_string(), 0),
            }

            completed += 1;
            on_progress(completed, total);
        })
        .await;

        for (file, mut outcome) in outcomes {
            match outcome.failure {
                Some((reason, error, attempts)) => {
                    ledger.record(&file, reason, Some(error), attempts);
                    report.record_failure(&file);
                }
                None => {
                    ledger.clear(&file);
                    outcome.terms.sort();
                    outcome.terms.dedup();
                    let added = terms.add_file_terms(&file, outcome.terms);
                    debug!("{}: {} new terms", file, added);
                    report.record_success();
                }
            }
        }

        terms.set_extraction_ledger(&ledger);
        info!(
            "Extraction finished: {} terms known, {} of {} files failed",
            terms.terms.len(),
            report.failed,
            report.processed
        );
        Ok(report)
    }
}
