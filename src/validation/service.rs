/*!
 * Validation service that runs every check over translation units.
 *
 * Markup mismatches are errors, for the built-in classes and for any
 * custom pattern the project configures. Unchanged translations are
 * informational for technical text and warnings otherwise (errors in
 * strict mode). Skipped units are never checked.
 */

use std::collections::HashMap;

use log::{debug, info};
use serde::Serialize;

use crate::translation::unit::{TranslationUnit, UnitStatus, normalize_whitespace};
use super::custom::CustomPattern;
use super::markup::{MarkupClass, MarkupDiff};
use super::quality::{self, QualityGrade};
use super::{IssueKind, Severity, ValidationIssue};

/// Translation validator
#[derive(Debug, Clone, Default)]
pub struct Validator {
    /// Report unchanged translations as errors
    strict_mode: bool,
    custom_patterns: Vec<CustomPattern>,
}

impl Validator {
    pub fn new(strict_mode: bool) -> Self {
        Self {
            strict_mode,
            custom_patterns: Vec::new(),
        }
    }

    /// Also compare these project-specific classes
    pub fn with_custom_patterns(mut self, patterns: Vec<CustomPattern>) -> Self {
        self.custom_patterns = patterns;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict_mode
    }

    /// Compare every markup class between a source and its translation
    pub fn check_markup(&self, key: &str, source: &str, translated: &str) -> Vec<ValidationIssue> {
        let builtin = MarkupClass::ALL.iter().filter_map(|class| {
            mismatch_issue(
                key,
                class.issue_kind(),
                class.description(),
                class.compare(source, translated),
                class.extract(source),
            )
        });
        let custom = self.custom_patterns.iter().filter_map(|pattern| {
            mismatch_issue(
                key,
                IssueKind::CustomPatternMismatch,
                &pattern.description,
                pattern.compare(source, translated),
                pattern.extract(source),
            )
        });
        builtin.chain(custom).collect()
    }

    /// Error-level issues a fresh translation of `source` would carry.
    ///
    /// Uses the same rules as `validate_unit`, so a result accepted here is
    /// not downgraded by a later revalidation.
    pub fn translation_errors(&self, key: &str, source: &str, translated: &str) -> Vec<ValidationIssue> {
        let mut unit = TranslationUnit::new(key, source);
        unit.apply_translation(translated);
        self.validate_unit(&unit)
            .unwrap_or_default()
            .into_iter()
            .filter(ValidationIssue::is_error)
            .collect()
    }

    /// Check a single unit. `None` when the unit is not checked at all.
    pub fn validate_unit(&self, unit: &TranslationUnit) -> Option<Vec<ValidationIssue>> {
        if unit.status == UnitStatus::Skipped {
            return None;
        }

        let translated = match unit.translated_text.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                if unit.status == UnitStatus::Pending {
                    return None;
                }
                return Some(vec![ValidationIssue::new(
                    &unit.key,
                    IssueKind::EmptyTranslation,
                    Severity::Error,
                    "Translation is empty but status is not pending",
                )]);
            }
        };

        let mut issues = Vec::new();
        if let Some(issue) = self.check_unchanged(unit, translated) {
            issues.push(issue);
        }
        issues.extend(self.check_markup(&unit.key, &unit.original_text, translated));
        Some(issues)
    }

    fn check_unchanged(&self, unit: &TranslationUnit, translated: &str) -> Option<ValidationIssue> {
        if translated.trim() == unit.original_text.trim() {
            if unit.is_technical() {
                return Some(ValidationIssue::new(
                    &unit.key,
                    IssueKind::TechnicalUnchanged,
                    Severity::Info,
                    "Technical text unchanged",
                ));
            }
            let severity = if self.strict_mode { Severity::Error } else { Severity::Warning };
            return Some(ValidationIssue::new(
                &unit.key,
                IssueKind::UnchangedText,
                severity,
                "Translation identical to source text",
            ));
        }

        if normalize_whitespace(translated) == normalize_whitespace(&unit.original_text) {
            return Some(ValidationIssue::new(
                &unit.key,
                IssueKind::ContentUnchanged,
                Severity::Info,
                "Translation differs from the source only in whitespace",
            ));
        }
        None
    }

    /// Validate a unit set and aggregate the results
    pub fn validate_units<'a>(&self, units: impl IntoIterator<Item = &'a TranslationUnit>) -> ValidationReport {
        let mut report = ValidationReport::default();

        for unit in units {
            let Some(issues) = self.validate_unit(unit) else {
                continue;
            };

            let errors = issues.iter().filter(|i| i.severity == Severity::Error).count();
            let warnings = issues.iter().filter(|i| i.severity == Severity::Warning).count();
            report.checked += 1;
            report.entry_scores.push(quality::entry_score(errors, warnings));
            report.issues.extend(issues);
        }

        debug!("{}", report.summary());
        report
    }

    /// Downgrade translated units with errors back to pending.
    ///
    /// Returns the keys of the downgraded units.
    pub fn revalidate(&self, units: &mut [TranslationUnit]) -> Vec<String> {
        let mut downgraded = Vec::new();

        for unit in units.iter_mut().filter(|u| u.status == UnitStatus::Translated) {
            let has_errors = self
                .validate_unit(unit)
                .is_some_and(|issues| issues.iter().any(ValidationIssue::is_error));
            if has_errors {
                unit.mark_pending();
                downgraded.push(unit.key.clone());
            }
        }

        if !downgraded.is_empty() {
            info!("Revalidation sent {} units back to pending", downgraded.len());
        }
        downgraded
    }
}

fn mismatch_issue(
    key: &str,
    kind: IssueKind,
    description: &str,
    diff: MarkupDiff,
    expected: Vec<String>,
) -> Option<ValidationIssue> {
    if diff.is_empty() {
        return None;
    }
    let suggestion = (!expected.is_empty())
        .then(|| format!("Expected {}: {}", description.to_lowercase(), expected.join(", ")));
    Some(
        ValidationIssue::new(key, kind, Severity::Error, format!("{} mismatch. {}", description, diff.describe()))
            .with_suggestion(suggestion),
    )
}

/// Aggregated validation results
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Units that were checked
    pub checked: usize,
    pub issues: Vec<ValidationIssue>,
    /// Quality score of each checked unit
    #[serde(skip)]
    pub entry_scores: Vec<f64>,
}

impl ValidationReport {
    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn infos(&self) -> usize {
        self.count(Severity::Info)
    }

    pub fn has_errors(&self) -> bool {
        self.errors() > 0
    }

    /// Issues of one kind
    pub fn of_kind(&self, kind: IssueKind) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|i| i.kind == kind).collect()
    }

    /// Issue count per kind
    pub fn counts_by_kind(&self) -> HashMap<IssueKind, usize> {
        let mut counts = HashMap::new();
        for issue in &self.issues {
            *counts.entry(issue.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn quality_score(&self) -> f64 {
        quality::project_score(&self.entry_scores)
    }

    pub fn grade(&self) -> QualityGrade {
        QualityGrade::from_score(self.quality_score())
    }

    pub fn summary(&self) -> String {
        format!(
            "Checked {} entries: {} errors, {} warnings",
            self.checked,
            self.errors(),
            self.warnings()
        )
    }
}
