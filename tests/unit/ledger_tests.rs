/*!
 * Tests for the failure ledger
 */

use loctrans::translation::{FailureLedger, FailureReason, FailureRecord};

#[test]
fn test_record_repeatedFailure_shouldAccumulateAttempts() {
    let ledger = FailureLedger::new();

    ledger.record("menu.start", FailureReason::ProcessingError, Some("timeout".into()), 3);
    ledger.record("menu.start", FailureReason::ProcessingError, Some("bad json".into()), 10);

    let record = ledger.get("menu.start").unwrap();
    assert_eq!(record.attempts, 13);
    assert_eq!(record.error.as_deref(), Some("bad json"));
    assert_eq!(ledger.len(), 1);
}

#[test]
fn test_clear_shouldRemoveSucceededItem() {
    let ledger = FailureLedger::new();
    ledger.record("a", FailureReason::ProcessingError, None, 1);

    assert!(ledger.clear("a"));
    assert!(!ledger.clear("a"));
    assert!(ledger.is_empty());
}

#[test]
fn test_retryable_ids_shouldSkipContextTooSmall() {
    let ledger = FailureLedger::new();
    ledger.record("b", FailureReason::ProcessingError, None, 3);
    ledger.record("huge", FailureReason::ContextTooSmall, None, 0);
    ledger.record("a.json", FailureReason::ExtractionFailed, None, 3);

    assert_eq!(ledger.retryable_ids(), vec!["a.json".to_string(), "b".to_string()]);
}

#[test]
fn test_clone_shouldShareRecords() {
    let ledger = FailureLedger::new();
    let worker_view = ledger.clone();

    worker_view.record("a", FailureReason::ProcessingError, None, 2);

    assert!(ledger.contains("a"));
}

#[test]
fn test_records_shouldSerializeWithSnakeCaseReasons() {
    let ledger = FailureLedger::from_records(vec![FailureRecord {
        id: "act1.json".to_string(),
        reason: FailureReason::ExtractionFailed,
        error: None,
        attempts: 10,
    }]);

    let json = serde_json::to_value(ledger.records()).unwrap();

    assert_eq!(json[0]["reason"], "extraction_failed");
    assert_eq!(json[0]["attempts"], 10);
    assert!(json[0].get("error").is_none());
}
