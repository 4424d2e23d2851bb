/*!
 * # loctrans - batch AI translation for game localization
 *
 * A Rust library for translating large localization corpora with AI
 * providers, resumable across crashes.
 *
 * ## Features
 *
 * - Three-stage pipeline: term extraction, glossary translation, content translation
 * - Translate using various AI providers:
 *   - Ollama (local LLM)
 *   - OpenAI, OpenRouter and LM Studio (OpenAI-compatible APIs)
 *   - Anthropic API
 * - Token-budget batching with bounded concurrency
 * - Content-addressed cache keyed by text, languages and glossary
 * - Failure ledgers with retry-only-failed passes
 * - Structural validation of placeholders, tags and entities
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `project`: Project directory layout and persisted state
 * - `translation`: The batch translation engine:
 *   - `translation::batch`: Token-budget batching
 *   - `translation::cache`: Translation cache
 *   - `translation::dispatcher`: Concurrent dispatch
 *   - `translation::pipeline`: Stage orchestration
 * - `validation`: Structural validation and quality scoring
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Client implementations for various LLM providers:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::openai`: OpenAI-compatible API client
 *   - `providers::anthropic`: Anthropic API client
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod project;
pub mod providers;
pub mod translation;
pub mod validation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{ProviderError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match, validate_language_code};
pub use project::{ProjectState, ProjectStore};
pub use translation::pipeline::{PipelineConfig, TranslationPipeline};
pub use translation::{Glossary, TranslationUnit};
pub use validation::Validator;
