/*!
 * Prompt engineering for game text translation.
 *
 * This module provides:
 * - System prompt templates for translation, extraction and glossary work
 * - JSON request and response shapes exchanged with the model
 */

pub mod templates;

// Re-export main types
pub use templates::{
    GlossaryTranslationResponse, PromptTemplate, TermExtractionResponse, TranslationPromptBuilder,
    TranslationResponse, glossary_translation_prompt, term_extraction_prompt,
};
