/*!
 * Failure ledger.
 *
 * Records items that exhausted their retries so that a later pass can
 * reprocess only what failed. One ledger exists per pipeline stage.
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Why an item ended up in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Term extraction produced no result for a file
    ExtractionFailed,
    /// The provider failed or returned an unusable result
    ProcessingError,
    /// The item cannot fit into any batch
    ContextTooSmall,
}

impl FailureReason {
    /// Whether a retry pass should pick the item up again
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ContextTooSmall)
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExtractionFailed => write!(f, "extraction_failed"),
            Self::ProcessingError => write!(f, "processing_error"),
            Self::ContextTooSmall => write!(f, "context_too_small"),
        }
    }
}

/// A single failed item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Unit key, file name or glossary term
    pub id: String,
    pub reason: FailureReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Attempts consumed across all runs
    #[serde(default)]
    pub attempts: u32,
}

/// Thread-safe set of failure records keyed by item id
#[derive(Debug, Clone, Default)]
pub struct FailureLedger {
    records: Arc<Mutex<BTreeMap<String, FailureRecord>>>,
}

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted records
    pub fn from_records(records: impl IntoIterator<Item = FailureRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self { records: Arc::new(Mutex::new(map)) }
    }

    /// Record a failure. A repeated failure keeps the latest error and
    /// accumulates the attempt count.
    pub fn record(&self, id: &str, reason: FailureReason, error: Option<String>, attempts: u32) {
        let mut records = self.records.lock();
        let entry = records.entry(id.to_string()).or_insert_with(|| FailureRecord {
            id: id.to_string(),
            reason,
            error: None,
            attempts: 0,
        });
        entry.reason = reason;
        entry.error = error;
        entry.attempts += attempts;
    }

    /// Remove an item after it succeeded. Returns true if it was present.
    pub fn clear(&self, id: &str) -> bool {
        self.records.lock().remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.lock().contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<FailureRecord> {
        self.records.lock().get(id).cloned()
    }

    /// Snapshot of all records, ordered by id
    pub fn records(&self) -> Vec<FailureRecord> {
        self.records.lock().values().cloned().collect()
    }

    /// Ids a retry pass should reprocess
    pub fn retryable_ids(&self) -> Vec<String> {
        self.records
            .lock()
            .values()
            .filter(|record| record.reason.is_retryable())
            .map(|record| record.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}
