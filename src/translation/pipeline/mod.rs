/*!
 * Translation pipeline for three-stage project translation.
 *
 * The pipeline processes a project through three stages:
 * 1. **Extract**: Find glossary terms in the source texts, per file
 * 2. **Glossary**: Translate the extracted terms and merge them into the glossary
 * 3. **Translate**: Translate pending units with the relevant glossary subset
 */

pub mod extract_pass;
pub mod glossary_pass;
pub mod orchestrator;
pub mod translation_pass;

// Re-export types used externally
pub use orchestrator::{
    PipelineConfig, PipelineProgress, PipelineReport, PipelineStage, ProgressCallback, StageConfig, StageReport,
    TranslationPipeline,
};
