/*!
 * Extracted glossary terms and the ledgers of the first two stages.
 *
 * `extracted_terms.json` maps every term to `{source, translated, context}`
 * and carries `failed_files` (extraction ledger) and `failed_terms`
 * (glossary translation ledger) next to the terms.
 */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::translation::glossary::Glossary;
use crate::translation::ledger::{FailureLedger, FailureRecord};

/// Context recorded for terms found by the extraction stage
pub const EXTRACTED_CONTEXT: &str = "extracted";

/// One extracted term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermEntry {
    pub source: String,
    #[serde(default)]
    pub translated: Option<String>,
    #[serde(default)]
    pub context: String,
}

/// Contents of `extracted_terms.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedTerms {
    #[serde(default)]
    pub failed_files: Vec<FailureRecord>,

    #[serde(default)]
    pub failed_terms: Vec<FailureRecord>,

    /// Terms found per source file
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub file_breakdown: BTreeMap<String, Vec<String>>,

    #[serde(flatten)]
    pub terms: BTreeMap<String, TermEntry>,
}

impl ExtractedTerms {
    /// Add terms that are not known yet. Returns the number added.
    pub fn add_terms<S: AsRef<str>>(&mut self, terms: &[S]) -> usize {
        let mut added = 0;
        for term in terms {
            let term = term.as_ref().trim();
            if term.is_empty() || self.terms.contains_key(term) {
                continue;
            }
            self.terms.insert(
                term.to_string(),
                TermEntry {
                    source: term.to_string(),
                    translated: None,
                    context: EXTRACTED_CONTEXT.to_string(),
                },
            );
            added += 1;
        }
        added
    }

    /// Record the terms found in one file and add them to the term set
    pub fn add_file_terms(&mut self, file: &str, terms: Vec<String>) -> usize {
        let added = self.add_terms(&terms);
        if !terms.is_empty() {
            self.file_breakdown.insert(file.to_string(), terms);
        }
        added
    }

    /// Terms with no translation yet
    pub fn untranslated(&self) -> Vec<String> {
        self.terms
            .values()
            .filter(|entry| entry.translated.as_deref().is_none_or(|t| t.trim().is_empty()))
            .map(|entry| entry.source.clone())
            .collect()
    }

    pub fn set_translation(&mut self, term: &str, translation: &str) -> bool {
        match self.terms.get_mut(term) {
            Some(entry) => {
                entry.translated = Some(translation.to_string());
                true
            }
            None => false,
        }
    }

    /// Translated terms as a glossary
    pub fn glossary(&self) -> Glossary {
        self.terms
            .iter()
            .filter_map(|(term, entry)| {
                entry
                    .translated
                    .as_ref()
                    .filter(|t| !t.trim().is_empty())
                    .map(|t| (term.clone(), t.clone()))
            })
            .collect()
    }

    pub fn extraction_ledger(&self) -> FailureLedger {
        FailureLedger::from_records(self.failed_files.clone())
    }

    pub fn glossary_ledger(&self) -> FailureLedger {
        FailureLedger::from_records(self.failed_terms.clone())
    }

    pub fn set_extraction_ledger(&mut self, ledger: &FailureLedger) {
        self.failed_files = ledger.records();
    }

    pub fn set_glossary_ledger(&mut self, ledger: &FailureLedger) {
        self.failed_terms = ledger.records();
    }
}
