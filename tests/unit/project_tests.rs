/*!
 * Tests for project state and the on-disk project layout
 */

use std::collections::BTreeMap;

use loctrans::project::{ExtractedTerms, ProjectStore};
use loctrans::translation::{FailureReason, UnitStatus};

use crate::common::{create_temp_dir, create_test_file, sample_project};

fn source_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_reimport_withChangedText_shouldInvalidateOnlyThatUnit() {
    let dir = create_temp_dir().unwrap();
    let store = sample_project(dir.path()).unwrap();

    let mut state = store.load_state().unwrap();
    state.import_translations(
        &source_map(&[("menu.start", "Почати подорож з Хорнет"), ("menu.quit", "Вийти до Мохової печери")]),
        false,
    );
    store.save_state(&state).unwrap();

    let mut state = store.load_state().unwrap();
    let summary = state.import_source_map(
        &source_map(&[
            ("menu.start", "Start   the journey with Hornet"),
            ("menu.quit", "Quit to the title screen"),
            ("menu.options", "Options"),
        ]),
        Some("act1.json"),
    );

    assert_eq!((summary.new, summary.updated, summary.unchanged), (1, 1, 1));
    assert_eq!(state.unit("menu.start").unwrap().status, UnitStatus::Translated);
    let quit = state.unit("menu.quit").unwrap();
    assert_eq!(quit.status, UnitStatus::Pending);
    assert!(quit.translated_text.is_none());
}

#[test]
fn test_import_translations_withoutOverwrite_shouldFillOnlyPending() {
    let dir = create_temp_dir().unwrap();
    let store = sample_project(dir.path()).unwrap();
    let mut state = store.load_state().unwrap();
    state.unit_mut("menu.quit").unwrap().apply_translation("Вихід");

    let applied = state.import_translations(
        &source_map(&[("menu.quit", "Вийти"), ("menu.start", "Почати"), ("missing", "x")]),
        false,
    );

    assert_eq!(applied, 1);
    assert_eq!(state.unit("menu.quit").unwrap().translated_text.as_deref(), Some("Вихід"));

    let applied = state.import_translations(&source_map(&[("menu.quit", "Вийти")]), true);
    assert_eq!(applied, 1);
    assert_eq!(state.unit("menu.quit").unwrap().translated_text.as_deref(), Some("Вийти"));
}

#[test]
fn test_progress_shouldCountStatuses() {
    let dir = create_temp_dir().unwrap();
    let store = sample_project(dir.path()).unwrap();
    let mut state = store.load_state().unwrap();
    state.unit_mut("menu.start").unwrap().apply_translation("Почати");
    state.unit_mut("hud.coins").unwrap().mark_skipped();

    let progress = state.progress();

    assert_eq!(progress.total, 5);
    assert_eq!(progress.translated, 1);
    assert_eq!(progress.skipped, 1);
    assert_eq!(progress.pending, 3);
    assert!((progress.completion_rate() - 20.0).abs() < 1e-9);
}

#[test]
fn test_state_ledger_shouldPersistAsFailedUnits() {
    let dir = create_temp_dir().unwrap();
    let store = sample_project(dir.path()).unwrap();
    let mut state = store.load_state().unwrap();

    let ledger = state.ledger();
    ledger.record("menu.quit", FailureReason::ProcessingError, Some("timeout".into()), 3);
    state.set_ledger(&ledger);
    store.save_state(&state).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(store.state_path()).unwrap()).unwrap();
    assert_eq!(raw["failed_units"][0]["id"], "menu.quit");
    assert_eq!(raw["source_language"], "en");
    assert_eq!(store.load_state().unwrap().ledger().get("menu.quit").unwrap().attempts, 3);
}

#[test]
fn test_init_withOtherLanguages_shouldRefuseExistingProject() {
    let dir = create_temp_dir().unwrap();
    let store = sample_project(dir.path()).unwrap();

    assert!(store.init("en", "pl").is_err());
    assert_eq!(store.init("en", "uk").unwrap().units.len(), 5);
}

#[test]
fn test_load_state_withoutProject_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let store = ProjectStore::new(dir.path().join("empty"));

    assert!(!store.is_initialized());
    assert!(store.load_state().is_err());
}

#[test]
fn test_load_context_shouldTrimAndIgnoreBlankFile() {
    let dir = create_temp_dir().unwrap();
    let store = sample_project(dir.path()).unwrap();
    assert!(store.load_context().unwrap().is_none());

    create_test_file(store.root(), "PROJECT_CONTEXT.md", "  \n").unwrap();
    assert!(store.load_context().unwrap().is_none());

    create_test_file(store.root(), "PROJECT_CONTEXT.md", "\nA gothic platformer.\n").unwrap();
    assert_eq!(store.load_context().unwrap().as_deref(), Some("A gothic platformer."));
}

#[test]
fn test_extracted_terms_shouldKeepTermsAtTopLevel() {
    let dir = create_temp_dir().unwrap();
    let store = sample_project(dir.path()).unwrap();
    let mut terms = ExtractedTerms::default();
    terms.add_file_terms("act1.json", vec!["Hornet".to_string(), "Moss Grotto".to_string()]);
    terms.set_translation("Hornet", "Хорнет");

    store.save_terms(&terms).unwrap();
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(store.extracted_terms_path()).unwrap()).unwrap();
    let reloaded = store.load_terms().unwrap();

    assert_eq!(raw["Hornet"]["translated"], "Хорнет");
    assert_eq!(raw["Moss Grotto"]["context"], "extracted");
    assert!(raw["failed_files"].as_array().unwrap().is_empty());
    assert_eq!(reloaded.terms.len(), 2);
    assert_eq!(reloaded.untranslated(), vec!["Moss Grotto".to_string()]);
    assert_eq!(reloaded.glossary().len(), 1);
}
