/*!
 * Tests for glossary storage and relevance matching
 */

use loctrans::translation::{Glossary, GlossaryMatcher};

use crate::common::create_temp_dir;

fn glossary(entries: &[(&str, &str)]) -> Glossary {
    entries
        .iter()
        .map(|(term, translation)| (term.to_string(), translation.to_string()))
        .collect()
}

#[test]
fn test_content_hash_shouldDependOnEntriesOnly() {
    let a = glossary(&[("Hornet", "Хорнет"), ("Silk", "Шовк")]);
    let b = glossary(&[("Silk", "Шовк"), ("Hornet", "Хорнет")]);
    let c = glossary(&[("Hornet", "Горнет"), ("Silk", "Шовк")]);

    assert_eq!(a.content_hash(), b.content_hash());
    assert_ne!(a.content_hash(), c.content_hash());
}

#[test]
fn test_merge_shouldNeverReplaceManualEntries() {
    let mut existing = glossary(&[("Hornet", "Хорнет")]);
    let extracted = glossary(&[("Hornet", "Шершень"), ("Bell", "Дзвін")]);

    let added = existing.merge(&extracted);

    assert_eq!(added, 1);
    assert_eq!(existing.get("Hornet"), Some("Хорнет"));
    assert_eq!(existing.get("Bell"), Some("Дзвін"));
}

#[test]
fn test_save_thenLoad_shouldUseTranslationsDocument() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("glossary.json");
    let original = glossary(&[("Silk", "Шовк")]);

    original.save(&path).unwrap();
    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(raw["translations"]["Silk"], "Шовк");
    assert_eq!(Glossary::load(&path).unwrap(), original);
}

#[test]
fn test_load_withMissingFile_shouldBeEmpty() {
    let dir = create_temp_dir().unwrap();
    assert!(Glossary::load(dir.path().join("absent.json")).unwrap().is_empty());
}

#[test]
fn test_relevant_shouldMatchOnlyTermsPresentInTexts() {
    let glossary = glossary(&[
        ("Hornet", "Хорнет"),
        ("Moss Grotto", "Мохова печера"),
        ("Citadel", "Цитадель"),
    ]);
    let matcher = GlossaryMatcher::new(&glossary);

    let relevant = matcher.relevant(&["HORNET reaches the moss grotto"]);

    assert_eq!(relevant.len(), 2);
    assert!(relevant.contains("Hornet"));
    assert!(relevant.contains("Moss Grotto"));
}

#[test]
fn test_relevant_limited_shouldTruncateInKeyOrder() {
    let glossary = glossary(&[("Bell", "Дзвін"), ("Hornet", "Хорнет"), ("Silk", "Шовк")]);
    let matcher = GlossaryMatcher::new(&glossary);

    let relevant = matcher.relevant_limited(&["Hornet rings the Bell for Silk"], Some(2));

    let terms: Vec<&String> = relevant.iter().map(|(term, _)| term).collect();
    assert_eq!(terms, vec!["Bell", "Hornet"]);
}

#[test]
fn test_coverage_shouldReportShareOfUsedTerms() {
    let glossary = glossary(&[("Bell", "Дзвін"), ("Hornet", "Хорнет"), ("Silk", "Шовк"), ("Needle", "Голка")]);
    let matcher = GlossaryMatcher::new(&glossary);

    let coverage = matcher.coverage(&["The Bell and the Needle"]);

    assert_eq!(coverage.total_terms, 4);
    assert_eq!(coverage.relevant_terms, 2);
    assert!((coverage.coverage_percent - 50.0).abs() < 1e-9);
}
