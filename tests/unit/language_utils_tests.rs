/*!
 * Tests for language utility functions
 */

use loctrans::language_utils::{LanguageCodeType, get_language_name, language_codes_match, validate_language_code};

/// Test validation of language codes
#[test]
fn test_validate_language_code_withValidCodes_shouldReturnCorrectType() {
    // ISO 639-1 tests
    assert_eq!(validate_language_code("en").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code("uk").unwrap(), LanguageCodeType::Part1);

    // ISO 639-2/T tests
    assert_eq!(validate_language_code("eng").unwrap(), LanguageCodeType::Part2T);
    assert_eq!(validate_language_code("ukr").unwrap(), LanguageCodeType::Part2T);

    // ISO 639-2/B tests
    assert_eq!(validate_language_code("fre").unwrap(), LanguageCodeType::Part2B);
    assert_eq!(validate_language_code("ger").unwrap(), LanguageCodeType::Part2B);

    // Whitespace and case tests
    assert_eq!(validate_language_code(" EN ").unwrap(), LanguageCodeType::Part1);
}

#[test]
fn test_validate_language_code_withInvalidCodes_shouldFail() {
    assert!(validate_language_code("xyz").is_err());
    assert!(validate_language_code("123").is_err());
    assert!(validate_language_code("e").is_err());
    assert!(validate_language_code("").is_err());
}

/// Game locales carry a region subtag
#[test]
fn test_validate_language_code_withRegion_shouldValidatePrimaryTag() {
    assert_eq!(validate_language_code("zh-TW").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code("es_419").unwrap(), LanguageCodeType::Part1);
    assert!(validate_language_code("qq-BR").is_err());
}

#[test]
fn test_get_language_name_withValidCodes_shouldReturnEnglishName() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("ger").unwrap(), "German");
    assert_eq!(get_language_name("zh-tw").unwrap(), "Chinese (TW)");
    assert!(get_language_name("zz").is_err());
}

/// Test matching of different language code formats
#[test]
fn test_language_codes_match_withMatchingCodes_shouldReturnTrue() {
    assert!(language_codes_match("en", "eng"));
    assert!(language_codes_match("fre", "fr"));
    assert!(language_codes_match("pt-BR", "por_br"));
}

#[test]
fn test_language_codes_match_withDifferentCodes_shouldReturnFalse() {
    assert!(!language_codes_match("en", "fr"));
    assert!(!language_codes_match("pt-BR", "pt"));
    assert!(!language_codes_match("xx", "xx"));
}
