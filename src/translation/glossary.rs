/*!
 * Glossary storage and relevance matching.
 *
 * The glossary is a case-sensitive `term -> translation` map. Only the
 * subset relevant to a batch is sent to the provider, selected by a
 * three-tier matcher:
 *
 * 1. exact, case-sensitive substring
 * 2. case-insensitive substring
 * 3. case-insensitive word-boundary regex
 */

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::file_utils::FileManager;

/// Term -> translation map with a deterministic content hash
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Glossary {
    terms: BTreeMap<String, String>,
}

/// On-disk layout of `glossary.json`
#[derive(Debug, Default, Serialize, Deserialize)]
struct GlossaryFile {
    #[serde(default)]
    translations: BTreeMap<String, String>,
}

impl Glossary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `{ "translations": {..} }`, empty when the file is absent
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file: GlossaryFile = FileManager::read_json_or_default(path)?;
        Ok(Self { terms: file.translations })
    }

    /// Save as `{ "translations": {..} }`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = GlossaryFile { translations: self.terms.clone() };
        FileManager::write_json_atomic(path, &file)
    }

    /// Add or replace a term
    pub fn insert(&mut self, term: impl Into<String>, translation: impl Into<String>) {
        self.terms.insert(term.into(), translation.into());
    }

    /// Translation for a term
    pub fn get(&self, term: &str) -> Option<&str> {
        self.terms.get(term).map(String::as_str)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate terms in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.terms.iter()
    }

    /// Merge new entries without replacing existing ones.
    ///
    /// Returns the number of terms added.
    pub fn merge(&mut self, other: &Glossary) -> usize {
        let mut added = 0;
        for (term, translation) in &other.terms {
            if !self.terms.contains_key(term) {
                self.terms.insert(term.clone(), translation.clone());
                added += 1;
            }
        }
        added
    }

    /// SHA-256 over the sorted entries, used as part of cache keys
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for (term, translation) in &self.terms {
            hasher.update(term.as_bytes());
            hasher.update([0u8]);
            hasher.update(translation.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }

    /// Render `term = translation` lines for a prompt
    pub fn format_for_prompt(&self) -> String {
        self.terms
            .iter()
            .map(|(term, translation)| format!("{} = {}", term, translation))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl FromIterator<(String, String)> for Glossary {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self { terms: iter.into_iter().collect() }
    }
}

/// Glossary coverage of a text set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    pub total_terms: usize,
    pub relevant_terms: usize,
    pub coverage_percent: f64,
}

struct TermMatcher {
    term: String,
    lowercase: String,
    word_pattern: Option<Regex>,
}

/// Finds the glossary terms relevant to a set of texts
pub struct GlossaryMatcher<'a> {
    glossary: &'a Glossary,
    matchers: Vec<TermMatcher>,
}

impl<'a> GlossaryMatcher<'a> {
    /// Precompile the per-term patterns
    pub fn new(glossary: &'a Glossary) -> Self {
        let matchers = glossary
            .terms
            .keys()
            .map(|term| TermMatcher {
                term: term.clone(),
                lowercase: term.to_lowercase(),
                word_pattern: Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term))).ok(),
            })
            .collect();

        Self { glossary, matchers }
    }

    fn matches(matcher: &TermMatcher, text: &str, text_lower: &str) -> bool {
        text.contains(&matcher.term)
            || text_lower.contains(&matcher.lowercase)
            || matcher
                .word_pattern
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(text))
    }

    /// All terms that match at least one text under any tier
    pub fn relevant<S: AsRef<str>>(&self, texts: &[S]) -> Glossary {
        let lowered: Vec<(&str, String)> = texts
            .iter()
            .map(|t| t.as_ref())
            .filter(|t| !t.is_empty())
            .map(|t| (t, t.to_lowercase()))
            .collect();

        let mut relevant = Glossary::new();
        if lowered.is_empty() {
            return relevant;
        }

        for matcher in &self.matchers {
            if lowered.iter().any(|(text, lower)| Self::matches(matcher, text, lower)) {
                if let Some(translation) = self.glossary.get(&matcher.term) {
                    relevant.insert(matcher.term.clone(), translation);
                }
            }
        }

        debug!(
            "Selected {} of {} glossary terms for {} texts",
            relevant.len(), self.glossary.len(), lowered.len()
        );
        relevant
    }

    /// Relevant terms truncated to `max_terms`, in key order
    pub fn relevant_limited<S: AsRef<str>>(&self, texts: &[S], max_terms: Option<usize>) -> Glossary {
        let relevant = self.relevant(texts);
        match max_terms {
            Some(limit) if relevant.len() > limit => relevant
                .terms
                .into_iter()
                .take(limit)
                .collect(),
            _ => relevant,
        }
    }

    /// How much of the glossary a text set uses
    pub fn coverage<S: AsRef<str>>(&self, texts: &[S]) -> CoverageReport {
        let total_terms = self.glossary.len();
        let relevant_terms = self.relevant(texts).len();
        let coverage_percent = if total_terms > 0 {
            relevant_terms as f64 / total_terms as f64 * 100.0
        } else {
            0.0
        };

        CoverageReport { total_terms, relevant_terms, coverage_percent }
    }
}
