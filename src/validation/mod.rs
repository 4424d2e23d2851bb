/*!
 * Validation module for translation quality assurance.
 *
 * This module checks produced translations against their source:
 * - Markup preservation (placeholders, compound ids, system variables,
 *   entities and tags, plus project-specific custom patterns)
 * - Empty and unchanged translations
 *
 * # Architecture
 *
 * - `markup`: Markup classes and multiset comparison
 * - `custom`: Custom pattern files
 * - `service`: The validator and project reports
 * - `quality`: Scores and grades
 */

pub mod custom;
pub mod markup;
pub mod quality;
pub mod service;

use serde::Serialize;

// Re-export main types
pub use custom::CustomPattern;
pub use markup::{MarkupClass, MarkupDiff};
pub use quality::QualityGrade;
pub use service::{ValidationReport, Validator};

/// Kind of validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    PlaceholderMismatch,
    CompoundIdMismatch,
    SystemVariableMismatch,
    HtmlEntityMismatch,
    TagMismatch,
    CustomPatternMismatch,
    EmptyTranslation,
    UnchangedText,
    TechnicalUnchanged,
    ContentUnchanged,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlaceholderMismatch => "placeholder_mismatch",
            Self::CompoundIdMismatch => "compound_id_mismatch",
            Self::SystemVariableMismatch => "system_variable_mismatch",
            Self::HtmlEntityMismatch => "html_entity_mismatch",
            Self::TagMismatch => "tag_mismatch",
            Self::CustomPatternMismatch => "custom_pattern_mismatch",
            Self::EmptyTranslation => "empty_translation",
            Self::UnchangedText => "unchanged_text",
            Self::TechnicalUnchanged => "technical_unchanged",
            Self::ContentUnchanged => "content_unchanged",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A single finding about one unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub key: String,
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    pub fn new(key: &str, kind: IssueKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            kind,
            severity,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.key, self.message)
    }
}
