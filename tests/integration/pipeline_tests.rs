/*!
 * End-to-end pipeline tests over an on-disk project
 */

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use loctrans::project::ProjectStore;
use loctrans::providers::LlmProvider;
use loctrans::providers::mock::{MockBackend, MockProvider};
use loctrans::translation::pipeline::{PipelineConfig, PipelineStage, TranslationPipeline};
use loctrans::translation::{FailureReason, Glossary, UnitStatus};
use loctrans::validation::IssueKind;

use crate::common::{create_temp_dir, create_test_file, init_logging, sample_project};

fn pipeline(provider: MockProvider, store: &ProjectStore, config: PipelineConfig) -> TranslationPipeline {
    TranslationPipeline::new(Arc::new(provider), store.clone(), config)
}

fn translate_only() -> PipelineConfig {
    PipelineConfig::new("en", "uk").with_skips(true, true)
}

fn single_unit_project(root: &std::path::Path, key: &str, text: &str) -> ProjectStore {
    let store = ProjectStore::new(root.join("project"));
    let mut state = store.init("en", "uk").unwrap();
    let entries: BTreeMap<String, String> = [(key.to_string(), text.to_string())].into_iter().collect();
    state.import_source_map(&entries, Some("strings.json"));
    store.save_state(&state).unwrap();
    store
}

fn answer(translated: &str) -> String {
    serde_json::json!({"translations": [{"id": 0, "translated": translated}]}).to_string()
}

#[tokio::test]
async fn test_run_withAllStages_shouldTranslateProjectAndBuildGlossary() {
    init_logging();
    let dir = create_temp_dir().unwrap();
    let store = sample_project(dir.path()).unwrap();
    let provider = MockProvider::working()
        .with_extraction("Hornet", &["Hornet", "Moss Grotto"])
        .with_extraction("Silk", &["Silk"]);

    let report = pipeline(provider.clone(), &store, PipelineConfig::new("en", "uk"))
        .run()
        .await
        .unwrap();

    let extract = report.extract.as_ref().unwrap();
    assert_eq!(extract.successful, 2);
    assert_eq!(report.glossary.as_ref().unwrap().successful, 3);
    assert_eq!(report.translate.successful, 5);
    assert_eq!(report.progress.translated, 5);
    assert!(report.downgraded.is_empty());
    assert!(!report.validation.has_errors());

    let glossary = store.load_glossary().unwrap();
    assert_eq!(glossary.get("Moss Grotto"), Some("[uk] Moss Grotto"));
    let state = store.load_state().unwrap();
    assert_eq!(
        state.unit("dialog.bell").unwrap().translated_text.as_deref(),
        Some("[uk] The <b>Bell</b> rings for {name}")
    );
    assert!(store.cache_path().exists());
}

#[tokio::test]
async fn test_run_withManualGlossaryEntry_shouldKeepIt() {
    let dir = create_temp_dir().unwrap();
    let store = sample_project(dir.path()).unwrap();
    let manual: Glossary = [("Hornet".to_string(), "Хорнет".to_string())].into_iter().collect();
    store.save_glossary(&manual).unwrap();
    let provider = MockProvider::working().with_extraction("Hornet", &["Hornet", "Moss Grotto"]);

    pipeline(provider, &store, PipelineConfig::new("en", "uk")).run().await.unwrap();

    let glossary = store.load_glossary().unwrap();
    assert_eq!(glossary.get("Hornet"), Some("Хорнет"));
    assert_eq!(glossary.get("Moss Grotto"), Some("[uk] Moss Grotto"));
    assert_eq!(glossary.len(), 2);
}

#[tokio::test]
async fn test_run_twice_shouldNotRetranslate() {
    let dir = create_temp_dir().unwrap();
    let store = sample_project(dir.path()).unwrap();
    let provider = MockProvider::working();
    let pipeline = pipeline(provider.clone(), &store, translate_only());

    pipeline.run().await.unwrap();
    let second = pipeline.run().await.unwrap();

    assert_eq!(provider.call_count("translate"), 1);
    assert_eq!(second.translate.processed, 0);
    assert!(second.extract.is_none());
    assert!(second.glossary.is_none());
    assert_eq!(provider.call_count("extract_terms"), 0);
}

#[tokio::test]
async fn test_retry_failed_afterTransientFailure_shouldClearLedger() {
    init_logging();
    let dir = create_temp_dir().unwrap();
    let store = sample_project(dir.path()).unwrap();
    let pipeline = pipeline(MockProvider::fail_first(1), &store, translate_only());

    let report = pipeline.run().await.unwrap();
    assert_eq!(report.translate.failed, 5);
    let state = store.load_state().unwrap();
    assert_eq!(state.failed_units.len(), 5);
    assert_eq!(state.ledger().get("menu.quit").unwrap().attempts, 3);

    let retried = pipeline.retry_failed(PipelineStage::Translate).await.unwrap();

    assert_eq!(retried.successful, 5);
    let state = store.load_state().unwrap();
    assert!(state.failed_units.is_empty());
    assert_eq!(state.progress().translated, 5);
}

#[tokio::test]
async fn test_retry_failed_withEmptyLedger_shouldDoNothing() {
    let dir = create_temp_dir().unwrap();
    let store = sample_project(dir.path()).unwrap();
    let provider = MockProvider::working();

    let report = pipeline(provider.clone(), &store, translate_only())
        .retry_failed(PipelineStage::Glossary)
        .await
        .unwrap();

    assert_eq!(report.processed, 0);
    assert_eq!(provider.call_count("translate_glossary"), 0);
}

#[tokio::test]
async fn test_run_withOversizedUnit_shouldRecordContextTooSmallAndNotRetryIt() {
    let dir = create_temp_dir().unwrap();
    let store = ProjectStore::new(dir.path().join("project"));
    let mut state = store.init("en", "uk").unwrap();
    let entries: BTreeMap<String, String> = [
        ("lore.book".to_string(), "Long lore page ".repeat(60)),
        ("menu.start".to_string(), "Start the journey".to_string()),
    ]
    .into_iter()
    .collect();
    state.import_source_map(&entries, Some("lore.json"));
    store.save_state(&state).unwrap();
    let provider = MockProvider::working();
    let pipeline = pipeline(provider.clone(), &store, translate_only().with_batch_tokens(1100));

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.translate.failed_ids, vec!["lore.book".to_string()]);
    assert_eq!(report.translate.successful, 1);
    let record = store.load_state().unwrap().ledger().get("lore.book").unwrap();
    assert_eq!(record.reason, FailureReason::ContextTooSmall);

    let calls = provider.call_count("translate");
    let retried = pipeline.retry_failed(PipelineStage::Translate).await.unwrap();
    assert_eq!(retried.processed, 0);
    assert_eq!(provider.call_count("translate"), calls);
}

#[tokio::test]
async fn test_run_withProjectContextFile_shouldSendContext() {
    let dir = create_temp_dir().unwrap();
    let store = ProjectStore::new(dir.path().join("project"));
    let mut state = store.init("en", "uk").unwrap();
    let entries: BTreeMap<String, String> =
        [("menu.start".to_string(), "Start the journey".to_string())].into_iter().collect();
    state.import_source_map(&entries, Some("menu.json"));
    store.save_state(&state).unwrap();
    create_test_file(store.root(), "PROJECT_CONTEXT.md", "A gothic platformer about a silk kingdom.\n").unwrap();

    let backend = MockBackend::always(r#"{"translations":[{"id":0,"translated":"Почати подорож"}]}"#);
    let provider = LlmProvider::new(backend.clone()).with_retry_delay(Duration::from_millis(1));
    let report = TranslationPipeline::new(Arc::new(provider), store.clone(), translate_only())
        .run()
        .await
        .unwrap();

    assert_eq!(report.translate.successful, 1);
    assert!(backend.requests()[0].prompt.contains("A gothic platformer about a silk kingdom."));
}

#[tokio::test]
async fn test_validate_project_withBrokenImportedTranslation_shouldDowngradeIt() {
    let dir = create_temp_dir().unwrap();
    let store = sample_project(dir.path()).unwrap();
    let mut state = store.load_state().unwrap();
    let imported: BTreeMap<String, String> = [
        ("hud.coins".to_string(), "У тебе є монети".to_string()),
        ("menu.quit".to_string(), "Вийти до Мохової печери".to_string()),
    ]
    .into_iter()
    .collect();
    state.import_translations(&imported, false);
    store.save_state(&state).unwrap();

    let (report, downgraded) = pipeline(MockProvider::working(), &store, translate_only())
        .validate_project()
        .unwrap();

    assert_eq!(downgraded, vec!["hud.coins".to_string()]);
    assert!(report.has_errors());
    let state = store.load_state().unwrap();
    assert_eq!(state.unit("hud.coins").unwrap().status, UnitStatus::Pending);
    assert_eq!(state.unit("menu.quit").unwrap().status, UnitStatus::Translated);
    let record = state.ledger().get("hud.coins").unwrap();
    assert_eq!(record.attempts, 0);
    assert!(record.error.unwrap().contains("placeholder_mismatch"));
}

#[tokio::test]
async fn test_retry_failed_withStrictValidationAndEchoedSource_shouldCallProviderAgain() {
    let dir = create_temp_dir().unwrap();
    let store = single_unit_project(dir.path(), "greeting", "Hello there friend");
    let backend = MockBackend::always(answer("Привіт, друже")).then(Ok(answer("Hello there friend")));
    let provider = LlmProvider::new(backend.clone()).with_retry_delay(Duration::from_millis(1));
    let pipeline = TranslationPipeline::new(
        Arc::new(provider),
        store.clone(),
        translate_only().with_strict_validation(true),
    );

    let report = pipeline.run().await.unwrap();
    assert_eq!(report.translate.failed, 1);
    assert_eq!(backend.attempts(), 1);
    let state = store.load_state().unwrap();
    assert_eq!(state.unit("greeting").unwrap().status, UnitStatus::Pending);
    assert!(state.ledger().get("greeting").unwrap().error.unwrap().contains("unchanged_text"));

    let retried = pipeline.retry_failed(PipelineStage::Translate).await.unwrap();

    assert_eq!(retried.successful, 1);
    assert_eq!(backend.attempts(), 2);
    let state = store.load_state().unwrap();
    assert_eq!(state.unit("greeting").unwrap().translated_text.as_deref(), Some("Привіт, друже"));
    assert!(state.failed_units.is_empty());
    let (_, downgraded) = pipeline.validate_project().unwrap();
    assert!(downgraded.is_empty());
}

#[tokio::test]
async fn test_run_withCustomPatternDropped_shouldRejectTranslation() {
    let dir = create_temp_dir().unwrap();
    let store = single_unit_project(dir.path(), "hint.jump", "Press [JUMP] to leap");
    let patterns = create_test_file(
        dir.path(),
        "patterns.json",
        r#"{"patterns": {"square_brackets": {"pattern": "\\[\\w+\\]", "description": "Action markers"}}}"#,
    )
    .unwrap();
    let backend = MockBackend::always(answer("Натисніть [JUMP], щоб стрибнути")).then(Ok(answer("Натисніть, щоб стрибнути")));
    let provider = LlmProvider::new(backend).with_retry_delay(Duration::from_millis(1));
    let pipeline = TranslationPipeline::new(
        Arc::new(provider),
        store.clone(),
        translate_only().with_custom_patterns(Some(patterns)),
    );

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.translate.failed, 1);
    let record = store.load_state().unwrap().ledger().get("hint.jump").unwrap();
    assert!(record.error.unwrap().contains("custom_pattern_mismatch"));

    let retried = pipeline.retry_failed(PipelineStage::Translate).await.unwrap();
    assert_eq!(retried.successful, 1);
    let (report, _) = pipeline.validate_project().unwrap();
    assert!(report.of_kind(IssueKind::CustomPatternMismatch).is_empty());
}

#[tokio::test]
async fn test_validate_project_withMissingPatternsFile_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let store = sample_project(dir.path()).unwrap();
    let config = translate_only().with_custom_patterns(Some(dir.path().join("absent.json")));

    let result = pipeline(MockProvider::working(), &store, config).validate_project();

    assert!(result.is_err());
}
