use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Accepts ISO 639-1 (2-letter) and ISO 639-2 (3-letter) codes, optionally
/// followed by a region subtag as used by game locales (`pt-BR`, `zh_CN`).
/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// ISO 639-2/B codes that differ from their 639-2/T counterpart
const PART2B_TO_PART2T: [(&str, &str); 18] = [
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Split `pt-BR` / `zh_CN` into the lowercase language and the optional region
fn split_locale(code: &str) -> (String, Option<String>) {
    let trimmed = code.trim();
    match trimmed.split_once(['-', '_']) {
        Some((language, region)) => (language.to_lowercase(), Some(region.to_uppercase())),
        None => (trimmed.to_lowercase(), None),
    }
}

fn lookup(language: &str) -> Option<(Language, LanguageCodeType)> {
    match language.len() {
        2 => Language::from_639_1(language).map(|lang| (lang, LanguageCodeType::Part1)),
        3 => {
            if let Some(lang) = Language::from_639_3(language) {
                return Some((lang, LanguageCodeType::Part2T));
            }
            PART2B_TO_PART2T
                .iter()
                .find(|(part2b, _)| *part2b == language)
                .and_then(|(_, part2t)| Language::from_639_3(part2t))
                .map(|lang| (lang, LanguageCodeType::Part2B))
        }
        _ => None,
    }
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let (language, _) = split_locale(code);
    lookup(&language)
        .map(|(_, kind)| kind)
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Get the language name from a code, keeping the region when present
pub fn get_language_name(code: &str) -> Result<String> {
    let (language, region) = split_locale(code);
    let (lang, _) = lookup(&language)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;

    Ok(match region {
        Some(region) => format!("{} ({})", lang.to_name(), region),
        None => lang.to_name().to_string(),
    })
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    let (a, region_a) = split_locale(code1);
    let (b, region_b) = split_locale(code2);
    match (lookup(&a), lookup(&b)) {
        (Some((lang_a, _)), Some((lang_b, _))) => lang_a == lang_b && region_a == region_b,
        _ => false,
    }
}
