/*!
 * Structural markup extraction.
 *
 * Each markup class is a regex over the text. A translation is structurally
 * sound when, for every class, it contains the same multiset of matches as
 * its source:
 * - Placeholders (`{name}`), compound ids excluded
 * - Compound ids (`{20204,5101}`)
 * - System variables (`$INPUT_ACTION$`)
 * - HTML/XML entities (`&lt;`, `&#8217;`)
 * - Tags (`<b>`, `<color=#fff>`), compared without attributes
 */

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::IssueKind;

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^}]+\}").expect("Invalid placeholder regex"));

static COMPOUND_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\d+,\d+\}").expect("Invalid compound id regex"));

static SYSTEM_VARIABLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$[^$]+\$").expect("Invalid system variable regex"));

static HTML_ENTITY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&[a-zA-Z0-9#]+;").expect("Invalid entity regex"));

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("Invalid tag regex"));

/// Tag name with an optional closing slash; the rest is attributes
static TAG_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<(/?[\w:-]+)[^>]*>$").expect("Invalid tag name regex"));

/// A class of markup that must survive translation unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupClass {
    Placeholder,
    CompoundId,
    SystemVariable,
    HtmlEntity,
    Tag,
}

impl MarkupClass {
    pub const ALL: [MarkupClass; 5] = [
        MarkupClass::Placeholder,
        MarkupClass::CompoundId,
        MarkupClass::SystemVariable,
        MarkupClass::HtmlEntity,
        MarkupClass::Tag,
    ];

    /// Issue reported when the class does not match
    pub fn issue_kind(&self) -> IssueKind {
        match self {
            Self::Placeholder => IssueKind::PlaceholderMismatch,
            Self::CompoundId => IssueKind::CompoundIdMismatch,
            Self::SystemVariable => IssueKind::SystemVariableMismatch,
            Self::HtmlEntity => IssueKind::HtmlEntityMismatch,
            Self::Tag => IssueKind::TagMismatch,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Placeholder => "Placeholders",
            Self::CompoundId => "Compound ids",
            Self::SystemVariable => "System variables",
            Self::HtmlEntity => "HTML entities",
            Self::Tag => "Tags",
        }
    }

    /// All occurrences of the class in `text`, in order
    pub fn extract(&self, text: &str) -> Vec<String> {
        match self {
            Self::Placeholder => PLACEHOLDER_REGEX
                .find_iter(text)
                .map(|m| m.as_str())
                .filter(|m| !is_compound_id(m))
                .map(str::to_string)
                .collect(),
            Self::CompoundId => collect(&COMPOUND_ID_REGEX, text),
            Self::SystemVariable => collect(&SYSTEM_VARIABLE_REGEX, text),
            Self::HtmlEntity => collect(&HTML_ENTITY_REGEX, text),
            Self::Tag => TAG_REGEX
                .find_iter(text)
                .map(|m| normalize_tag(m.as_str()))
                .collect(),
        }
    }

    /// Compare the class between a source text and its translation
    pub fn compare(&self, source: &str, translated: &str) -> MarkupDiff {
        MarkupDiff::between(&self.extract(source), &self.extract(translated))
    }
}

fn collect(regex: &Regex, text: &str) -> Vec<String> {
    regex.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

fn is_compound_id(token: &str) -> bool {
    COMPOUND_ID_REGEX
        .find(token)
        .is_some_and(|m| m.start() == 0 && m.end() == token.len())
}

/// `<color=#fff>` becomes `<color>`, `</b>` stays `</b>`
pub fn normalize_tag(tag: &str) -> String {
    match TAG_NAME_REGEX.captures(tag) {
        Some(captures) => format!("<{}>", &captures[1]),
        None => tag.to_string(),
    }
}

/// Multiset difference between source and translated markup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkupDiff {
    /// In the source, not in the translation (with multiplicity)
    pub missing: Vec<String>,
    /// In the translation, not in the source (with multiplicity)
    pub extra: Vec<String>,
}

impl MarkupDiff {
    pub fn between(source: &[String], translated: &[String]) -> Self {
        let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
        for item in source {
            *counts.entry(item.as_str()).or_insert(0) += 1;
        }
        for item in translated {
            *counts.entry(item.as_str()).or_insert(0) -= 1;
        }

        let mut diff = Self::default();
        for (item, count) in counts {
            let target = if count > 0 { &mut diff.missing } else { &mut diff.extra };
            for _ in 0..count.unsigned_abs() {
                target.push(item.to_string());
            }
        }
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }

    /// "Missing: {a}, {b}; Extra: {c}"
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("Missing: {}", self.missing.join(", ")));
        }
        if !self.extra.is_empty() {
            parts.push(format!("Extra: {}", self.extra.join(", ")));
        }
        parts.join("; ")
    }
}
