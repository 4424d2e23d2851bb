/*!
 * Tests for the content-addressed translation cache
 */

use loctrans::translation::TranslationCache;
use loctrans::translation::cache::cache_key;

use crate::common::create_temp_dir;

#[test]
fn test_cache_key_withWhitespaceVariants_shouldMatch() {
    assert_eq!(
        cache_key("Hello   world\n", "en", "uk", "g"),
        cache_key("Hello world", "en", "uk", "g")
    );
}

#[test]
fn test_cache_key_withDifferentGlossaryHash_shouldDiffer() {
    assert_ne!(cache_key("Hello", "en", "uk", "a"), cache_key("Hello", "en", "uk", "b"));
    assert_ne!(cache_key("Hello", "en", "uk", "a"), cache_key("Hello", "en", "pl", "a"));
}

#[test]
fn test_put_withExistingKey_shouldKeepFirstTranslation() {
    let cache = TranslationCache::in_memory();

    cache.put("Hello", "en", "uk", "g", "Привіт");
    cache.put("Hello", "en", "uk", "g", "Вітаю");

    assert_eq!(cache.get("Hello", "en", "uk", "g").as_deref(), Some("Привіт"));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_get_withOtherLanguagePair_shouldMiss() {
    let cache = TranslationCache::in_memory();
    cache.put("Hello", "en", "uk", "g", "Привіт");

    assert!(cache.get("Hello", "en", "pl", "g").is_none());
    assert!(cache.get("Hello", "de", "uk", "g").is_none());
}

#[test]
fn test_flush_thenLoad_shouldRestoreEntries() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("cache").join("translation_cache.json");

    let cache = TranslationCache::load(&path).unwrap();
    assert!(cache.is_empty());
    cache.put("Hello", "en", "uk", "g", "Привіт");
    assert!(cache.is_dirty());
    cache.flush().unwrap();
    assert!(!cache.is_dirty());

    let reloaded = TranslationCache::load(&path).unwrap();
    assert_eq!(reloaded.get("Hello", "en", "uk", "g").as_deref(), Some("Привіт"));
}

#[test]
fn test_stats_shouldCountHitsAndMisses() {
    let cache = TranslationCache::in_memory();
    cache.put("Hello", "en", "uk", "g", "Привіт");

    cache.get("Hello", "en", "uk", "g");
    cache.get("Bye", "en", "uk", "g");

    let (hits, misses, rate) = cache.stats();
    assert_eq!((hits, misses), (1, 1));
    assert!((rate - 0.5).abs() < f64::EPSILON);
}
