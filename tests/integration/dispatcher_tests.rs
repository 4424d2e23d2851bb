/*!
 * Dispatcher tests: cache idempotence, invalidation, ledger and merging
 */

use std::sync::Arc;
use std::time::Duration;

use loctrans::providers::LlmProvider;
use loctrans::providers::mock::{MockBackend, MockProvider};
use loctrans::translation::{
    Batch, DispatchConfig, Dispatcher, FailureLedger, FailureReason, Glossary, TokenBatcher, TranslationCache,
    TranslationUnit,
};
use loctrans::validation::Validator;

use crate::common::sized_units;

fn batches(units: &[TranslationUnit], budget: usize) -> Vec<Batch<TranslationUnit>> {
    TokenBatcher::new(budget).batch(units).unwrap().batches
}

fn units() -> Vec<TranslationUnit> {
    vec![
        TranslationUnit::new("menu.start", "Start the journey with Hornet"),
        TranslationUnit::new("menu.quit", "Quit to the Moss Grotto"),
        TranslationUnit::new("hud.coins", "You have {coins} coins"),
    ]
}

fn hornet_glossary() -> Glossary {
    [("Hornet".to_string(), "Хорнет".to_string())].into_iter().collect()
}

#[tokio::test]
async fn test_run_twiceWithSameCache_shouldCallProviderOnce() {
    let provider = MockProvider::working();
    let cache = TranslationCache::in_memory();
    let dispatcher = Dispatcher::new(
        Arc::new(provider.clone()),
        cache.clone(),
        FailureLedger::new(),
        DispatchConfig::new("en", "uk"),
    );

    let first = dispatcher.run(batches(&units(), 4000), &hornet_glossary(), |_| {}).await;
    let second = dispatcher.run(batches(&units(), 4000), &hornet_glossary(), |_| {}).await;

    assert_eq!(provider.call_count("translate"), 1);
    assert_eq!(first.provider_calls, 1);
    assert_eq!(first.successful, 3);
    assert_eq!(second.provider_calls, 0);
    assert_eq!(second.cache_hits, 3);
    assert_eq!(second.successful, 3);
    assert_eq!(cache.len(), 3);
}

#[tokio::test]
async fn test_run_withChangedGlossary_shouldMissCache() {
    let provider = MockProvider::working();
    let cache = TranslationCache::in_memory();
    let dispatcher = Dispatcher::new(
        Arc::new(provider.clone()),
        cache.clone(),
        FailureLedger::new(),
        DispatchConfig::new("en", "uk"),
    );

    dispatcher.run(batches(&units(), 4000), &hornet_glossary(), |_| {}).await;
    let mut extended = hornet_glossary();
    extended.insert("Bell", "Дзвін");
    let report = dispatcher.run(batches(&units(), 4000), &extended, |_| {}).await;

    assert_eq!(report.cache_hits, 0);
    assert_eq!(provider.call_count("translate"), 2);
    assert_eq!(cache.len(), 6);
}

#[tokio::test]
async fn test_run_withOtherTargetLanguage_shouldMissCache() {
    let provider = MockProvider::working();
    let cache = TranslationCache::in_memory();
    let ledger = FailureLedger::new();

    Dispatcher::new(Arc::new(provider.clone()), cache.clone(), ledger.clone(), DispatchConfig::new("en", "uk"))
        .run(batches(&units(), 4000), &Glossary::new(), |_| {})
        .await;
    let report = Dispatcher::new(Arc::new(provider.clone()), cache.clone(), ledger, DispatchConfig::new("en", "pl"))
        .run(batches(&units(), 4000), &Glossary::new(), |_| {})
        .await;

    assert_eq!(report.cache_hits, 0);
    assert_eq!(provider.call_count("translate"), 2);
}

#[tokio::test]
async fn test_run_withOutOfOrderCompletion_shouldMergeByKey() {
    let provider = MockProvider::staggered(40, 3);
    let all = sized_units(12, 400);
    let planned = batches(&all, 1500);
    assert_eq!(planned.len(), 3);

    let mut seen = Vec::new();
    let mut merged = std::collections::HashMap::new();
    let report = Dispatcher::new(
        Arc::new(provider.clone()),
        TranslationCache::in_memory(),
        FailureLedger::new(),
        DispatchConfig::new("en", "uk").with_workers(3),
    )
    .run(planned, &Glossary::new(), |outcome| {
        seen.push(outcome.index);
        merged.extend(outcome.translations.clone());
    })
    .await;

    assert_ne!(seen, vec![0, 1, 2], "batches should complete out of order");
    seen.sort();
    assert_eq!(seen, vec![0, 1, 2]);
    assert_eq!(report.successful, 12);
    assert_eq!(provider.call_count("translate"), 3);
    for unit in &all {
        assert_eq!(merged[&unit.key], MockProvider::translated(&unit.original_text, "uk"));
    }
}

#[tokio::test]
async fn test_run_withFailingProvider_shouldRecordEveryUnitWithAttempts() {
    let ledger = FailureLedger::new();
    let dispatcher = Dispatcher::new(
        Arc::new(MockProvider::failing()),
        TranslationCache::in_memory(),
        ledger.clone(),
        DispatchConfig::new("en", "uk").with_max_retries(4),
    );

    let report = dispatcher.run(batches(&units(), 4000), &Glossary::new(), |_| {}).await;

    assert_eq!(report.failed, 3);
    assert_eq!(report.successful, 0);
    assert_eq!(ledger.len(), 3);
    let record = ledger.get("hud.coins").unwrap();
    assert_eq!(record.reason, FailureReason::ProcessingError);
    assert_eq!(record.attempts, 4);
}

#[tokio::test]
async fn test_run_afterFailure_shouldClearLedgerOnSuccess() {
    let ledger = FailureLedger::new();
    let cache = TranslationCache::in_memory();
    let config = DispatchConfig::new("en", "uk");

    Dispatcher::new(Arc::new(MockProvider::failing()), cache.clone(), ledger.clone(), config.clone())
        .run(batches(&units(), 4000), &Glossary::new(), |_| {})
        .await;
    assert_eq!(ledger.len(), 3);

    Dispatcher::new(Arc::new(MockProvider::working()), cache, ledger.clone(), config)
        .run(batches(&units(), 4000), &Glossary::new(), |_| {})
        .await;

    assert!(ledger.is_empty());
}

#[tokio::test]
async fn test_run_withSmartGlossary_shouldSendOnlyRelevantTerms() {
    let backend = MockBackend::always(r#"{"translations":[{"id":0,"translated":"Почати з Хорнет"}]}"#);
    let provider = LlmProvider::new(backend.clone()).with_retry_delay(Duration::from_millis(1));
    let mut glossary = hornet_glossary();
    glossary.insert("Silk", "Шовк");
    let unit = vec![TranslationUnit::new("menu.start", "Start with Hornet")];

    let report = Dispatcher::new(
        Arc::new(provider),
        TranslationCache::in_memory(),
        FailureLedger::new(),
        DispatchConfig::new("en", "uk"),
    )
    .run(batches(&unit, 4000), &glossary, |_| {})
    .await;

    assert_eq!(report.successful, 1);
    let prompt = &backend.requests()[0].prompt;
    assert!(prompt.contains("Хорнет"));
    assert!(!prompt.contains("Шовк"));
}

#[tokio::test]
async fn test_run_withBrokenMarkup_shouldRejectAndNotCache() {
    let backend = MockBackend::always(r#"{"translations":[{"id":0,"translated":"У тебе є монети"}]}"#);
    let provider = LlmProvider::new(backend).with_retry_delay(Duration::from_millis(1));
    let cache = TranslationCache::in_memory();
    let ledger = FailureLedger::new();
    let unit = vec![TranslationUnit::new("hud.coins", "You have {coins} coins")];

    let report = Dispatcher::new(Arc::new(provider), cache.clone(), ledger.clone(), DispatchConfig::new("en", "uk"))
        .with_validator(Validator::default())
        .run(batches(&unit, 4000), &Glossary::new(), |_| {})
        .await;

    assert_eq!(report.failed_keys, vec!["hud.coins".to_string()]);
    assert!(cache.is_empty());
    let error = ledger.get("hud.coins").unwrap().error.unwrap();
    assert!(error.starts_with("Validation failed"));
    assert!(error.contains("placeholder_mismatch"));
}
