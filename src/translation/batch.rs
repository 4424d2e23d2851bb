/*!
 * Token-bounded batch planning.
 *
 * This module splits an ordered list of items into batches whose estimated
 * token cost fits a provider budget. Packing is greedy and deterministic,
 * preserves input order, and never produces an empty batch.
 */

use log::{debug, warn};

use crate::errors::TranslationError;
use super::unit::TranslationUnit;

/// Tokens reserved for prompt boilerplate in every request
pub const PROMPT_OVERHEAD_TOKENS: usize = 1000;

/// Coarse, language-agnostic token estimate: one token per four characters
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Anything that can be packed into a batch
pub trait BatchItem {
    /// Stable identifier of the item
    fn batch_key(&self) -> &str;

    /// Text whose size determines the item's cost
    fn batch_text(&self) -> &str;
}

impl BatchItem for TranslationUnit {
    fn batch_key(&self) -> &str {
        &self.key
    }

    fn batch_text(&self) -> &str {
        &self.original_text
    }
}

/// Glossary terms are their own key
impl BatchItem for String {
    fn batch_key(&self) -> &str {
        self
    }

    fn batch_text(&self) -> &str {
        self
    }
}

/// A group of items sent to a provider in one logical request
#[derive(Debug, Clone)]
pub struct Batch<T> {
    /// Position of the batch in the plan
    pub index: usize,

    /// Items in input order
    pub items: Vec<T>,

    /// Sum of the items' estimated token costs
    pub estimated_tokens: usize,
}

impl<T: BatchItem> Batch<T> {
    /// Keys of every item in the batch
    pub fn keys(&self) -> Vec<String> {
        self.items.iter().map(|i| i.batch_key().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Result of batch planning
#[derive(Debug, Clone)]
pub struct BatchPlan<T> {
    /// Planned batches, in input order
    pub batches: Vec<Batch<T>>,

    /// Keys of items that exceeded the budget and were isolated
    pub oversized: Vec<String>,
}

impl<T> BatchPlan<T> {
    /// Number of items across all batches
    pub fn item_count(&self) -> usize {
        self.batches.iter().map(|b| b.items.len()).sum()
    }
}

/// Greedy token-budget batcher
#[derive(Debug, Clone, Copy)]
pub struct TokenBatcher {
    target_tokens: usize,
    overhead_tokens: usize,
}

impl TokenBatcher {
    /// Create a batcher for the given per-request token budget
    pub fn new(target_tokens: usize) -> Self {
        Self {
            target_tokens,
            overhead_tokens: PROMPT_OVERHEAD_TOKENS,
        }
    }

    /// Override the reserved prompt overhead
    pub fn with_overhead(mut self, overhead_tokens: usize) -> Self {
        self.overhead_tokens = overhead_tokens;
        self
    }

    /// Tokens left for text once the overhead is reserved
    pub fn available_tokens(&self) -> Result<usize, TranslationError> {
        match self.target_tokens.checked_sub(self.overhead_tokens) {
            Some(available) if available > 0 => Ok(available),
            _ => Err(TranslationError::InvalidTokenBudget {
                target: self.target_tokens,
                overhead: self.overhead_tokens,
            }),
        }
    }

    /// Split items into batches.
    ///
    /// An item larger than the available budget is placed alone in its own
    /// batch, unless it is the first item, which yields `ContextTooSmall`.
    pub fn batch<T: BatchItem + Clone>(&self, items: &[T]) -> Result<BatchPlan<T>, TranslationError> {
        let available = self.available_tokens()?;

        let mut batches: Vec<Batch<T>> = Vec::new();
        let mut oversized = Vec::new();
        let mut current: Vec<T> = Vec::new();
        let mut current_tokens = 0usize;

        for (position, item) in items.iter().enumerate() {
            let cost = estimate_tokens(item.batch_text());

            if cost > available {
                if position == 0 {
                    return Err(TranslationError::ContextTooSmall {
                        key: item.batch_key().to_string(),
                        required: cost,
                        available,
                    });
                }

                warn!(
                    "Item '{}' needs ~{} tokens but only {} are available, isolating it in its own batch",
                    item.batch_key(), cost, available
                );
                if !current.is_empty() {
                    push_batch(&mut batches, std::mem::take(&mut current), current_tokens);
                    current_tokens = 0;
                }
                push_batch(&mut batches, vec![item.clone()], cost);
                oversized.push(item.batch_key().to_string());
                continue;
            }

            if !current.is_empty() && current_tokens + cost > available {
                push_batch(&mut batches, std::mem::take(&mut current), current_tokens);
                current_tokens = 0;
            }

            current.push(item.clone());
            current_tokens += cost;
        }

        if !current.is_empty() {
            push_batch(&mut batches, current, current_tokens);
        }

        debug!(
            "Planned {} batches for {} items ({} tokens available per batch)",
            batches.len(), items.len(), available
        );

        Ok(BatchPlan { batches, oversized })
    }
}

fn push_batch<T>(batches: &mut Vec<Batch<T>>, items: Vec<T>, estimated_tokens: usize) {
    let index = batches.len();
    batches.push(Batch { index, items, estimated_tokens });
}
