/*!
 * Tests for structural validation and quality scoring
 */

use loctrans::translation::{TranslationUnit, UnitStatus};
use loctrans::validation::{CustomPattern, IssueKind, MarkupClass, QualityGrade, Severity, Validator};

fn translated(key: &str, source: &str, translation: &str) -> TranslationUnit {
    let mut unit = TranslationUnit::new(key, source);
    unit.apply_translation(translation);
    unit
}

#[test]
fn test_check_markup_withMissingPlaceholders_shouldNameBoth() {
    let issues = Validator::default().check_markup(
        "hud.greeting",
        "Hi {name}, you have {coins} coins",
        "Привіт, у тебе є монети",
    );

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::PlaceholderMismatch);
    assert_eq!(issues[0].severity, Severity::Error);
    assert!(issues[0].message.contains("{coins}"));
    assert!(issues[0].message.contains("{name}"));
    assert_eq!(
        issues[0].suggestion.as_deref(),
        Some("Expected placeholders: {name}, {coins}")
    );
}

#[test]
fn test_check_markup_withUnclosedTag_shouldReportTagMismatch() {
    let issues = Validator::default().check_markup("dialog.bell", "The <b>Bell</b> rings", "<b>Дзвін дзвонить");

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::TagMismatch);
    assert!(issues[0].message.contains("Missing: </b>"));
}

#[test]
fn test_check_markup_withReorderedMarkup_shouldPass() {
    let issues = Validator::default().check_markup(
        "dialog.order",
        "{name} found {count} <color=#ff0>coins</color>",
        "<color=#0f0>Монет</color> {count} знайшов {name}",
    );
    assert!(issues.is_empty());
}

#[test]
fn test_check_markup_withEveryClassBroken_shouldReportEachOnce() {
    let issues = Validator::default().check_markup(
        "all",
        "{player} {20204,5101} $INPUT_JUMP$ &lt; <i>x</i>",
        "гравець",
    );

    let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind).collect();
    assert_eq!(
        kinds,
        vec![
            IssueKind::PlaceholderMismatch,
            IssueKind::CompoundIdMismatch,
            IssueKind::SystemVariableMismatch,
            IssueKind::HtmlEntityMismatch,
            IssueKind::TagMismatch,
        ]
    );
}

#[test]
fn test_placeholder_extract_shouldNotCountCompoundIdsTwice() {
    let text = "Take {20204,5101} to {place}";
    assert_eq!(MarkupClass::Placeholder.extract(text), vec!["{place}"]);
    assert_eq!(MarkupClass::CompoundId.extract(text), vec!["{20204,5101}"]);
}

#[test]
fn test_check_markup_withExtraPlaceholder_shouldReportExtra() {
    let issues = Validator::default().check_markup("k", "Hello", "Привіт {name}");

    assert_eq!(issues.len(), 1);
    assert!(issues[0].message.contains("Extra: {name}"));
    assert!(issues[0].suggestion.is_none());
}

#[test]
fn test_validate_units_shouldSkipPendingAndSkippedUnits() {
    let mut skipped = TranslationUnit::new("skipped", "{0}");
    skipped.mark_skipped();
    let units = vec![
        TranslationUnit::new("pending", "Hello {name}"),
        skipped,
        translated("ok", "Hello {name}", "Привіт {name}"),
    ];

    let report = Validator::default().validate_units(&units);

    assert_eq!(report.checked, 1);
    assert!(report.issues.is_empty());
    assert_eq!(report.quality_score(), 100.0);
    assert_eq!(report.grade(), QualityGrade::A);
}

#[test]
fn test_validate_units_shouldAggregateScoresAndCounts() {
    let units = vec![
        translated("a", "Hello {name}", "Привіт"),
        translated("b", "Quit", "Quit"),
        translated("c", "Start", "Почати"),
    ];

    let report = Validator::default().validate_units(&units);

    assert_eq!(report.errors(), 1);
    assert_eq!(report.warnings(), 1);
    assert_eq!(report.counts_by_kind()[&IssueKind::UnchangedText], 1);
    assert_eq!(report.of_kind(IssueKind::PlaceholderMismatch)[0].key, "a");
    // (90 + 98 + 100) / 3
    assert!((report.quality_score() - 96.0).abs() < 1e-9);
    assert_eq!(report.grade(), QualityGrade::A);
}

#[test]
fn test_validate_unit_withStrictMode_shouldTreatUnchangedAsError() {
    let unit = translated("b", "Quit", "Quit");

    let lenient = Validator::new(false).validate_unit(&unit).unwrap();
    let strict = Validator::new(true).validate_unit(&unit).unwrap();

    assert_eq!(lenient[0].severity, Severity::Warning);
    assert_eq!(strict[0].severity, Severity::Error);
}

#[test]
fn test_revalidate_shouldSendBrokenTranslationsBackToPending() {
    let mut units = vec![
        translated("bad", "The <b>Bell</b>", "<b>Дзвін"),
        translated("good", "The <b>Bell</b>", "<b>Дзвін</b>"),
    ];

    let downgraded = Validator::default().revalidate(&mut units);

    assert_eq!(downgraded, vec!["bad".to_string()]);
    assert_eq!(units[0].status, UnitStatus::Pending);
    assert_eq!(units[0].translated_text.as_deref(), Some("<b>Дзвін"));
    assert_eq!(units[1].status, UnitStatus::Translated);
}

#[test]
fn test_grade_fromScore_shouldUseTenPointBands() {
    assert_eq!(QualityGrade::from_score(90.0), QualityGrade::A);
    assert_eq!(QualityGrade::from_score(89.9), QualityGrade::B);
    assert_eq!(QualityGrade::from_score(70.0), QualityGrade::C);
    assert_eq!(QualityGrade::from_score(65.0), QualityGrade::D);
    assert_eq!(QualityGrade::from_score(10.0), QualityGrade::F);
}

#[test]
fn test_check_markup_withCustomPattern_shouldReportMismatchAsError() {
    let validator = Validator::default()
        .with_custom_patterns(vec![CustomPattern::new("special_ids", r"#\d{4,6}", Some("Special ids")).unwrap()]);

    let issues = validator.check_markup("quest.reward", "Reward #1234 for {name}", "Нагорода для {name}");

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::CustomPatternMismatch);
    assert_eq!(issues[0].severity, Severity::Error);
    assert!(issues[0].message.contains("#1234"));
    assert_eq!(issues[0].suggestion.as_deref(), Some("Expected special ids: #1234"));
}

#[test]
fn test_translation_errors_withStrictMode_shouldMatchRevalidation() {
    let strict = Validator::new(true);
    let errors = strict.translation_errors("k", "Hello there friend", "Hello there friend");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, IssueKind::UnchangedText);

    assert!(Validator::new(false).translation_errors("k", "Hello there friend", "Hello there friend").is_empty());
    assert!(strict.translation_errors("k", "42", "42").is_empty());
}
