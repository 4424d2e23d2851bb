/*!
 * Batch translation engine.
 *
 * This module contains the core functionality for translating large sets
 * of units through AI providers. It is split into several submodules:
 *
 * - `unit`: Translation units and their lifecycle
 * - `batch`: Token-budget batching
 * - `cache`: Content-addressed translation cache
 * - `glossary`: Glossary storage and relevance matching
 * - `ledger`: Failure tracking for retry passes
 * - `retry`: Retry policy for provider operations
 * - `concurrency`: Provider profiles and the bounded worker pool
 * - `dispatcher`: Concurrent batch dispatch
 * - `prompts`: Prompt templates and builders
 * - `pipeline`: The three-stage project pipeline
 */

// Re-export main types for easier usage
pub use self::batch::{Batch, BatchPlan, TokenBatcher};
pub use self::cache::TranslationCache;
pub use self::dispatcher::{DispatchConfig, DispatchReport, Dispatcher};
pub use self::glossary::{Glossary, GlossaryMatcher};
pub use self::ledger::{FailureLedger, FailureReason, FailureRecord};
pub use self::unit::{ProgressStats, TranslationUnit, UnitStatus};

// Re-export prompt types
pub use self::prompts::{PromptTemplate, TranslationPromptBuilder};

// Submodules
pub mod batch;
pub mod cache;
pub mod concurrency;
pub mod dispatcher;
pub mod glossary;
pub mod ledger;
pub mod pipeline;
pub mod prompts;
pub mod retry;
pub mod unit;
