/*!
 * Translation units and their lifecycle.
 *
 * A unit is one atomic piece of source text with a stable key. Its
 * `source_hash` tracks the normalized original text so that an edited
 * source invalidates the existing translation.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

static WHITESPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Markup stripped before deciding whether a text is technical
static TECHNICAL_MARKUP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]+>|\{[^}]+\}|\[[^\]]+\]").expect("Invalid technical markup regex")
});

/// Translation status of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    /// Waiting for a (re)translation
    #[default]
    Pending,
    /// Holds an accepted translation
    Translated,
    /// Excluded from translation
    Skipped,
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Translated => write!(f, "translated"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Single translation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Unique, stable identifier
    pub key: String,

    /// Source text
    pub original_text: String,

    /// Accepted translation, if any
    #[serde(default)]
    pub translated_text: Option<String>,

    /// Hash of the normalized source text
    pub source_hash: String,

    /// Current status
    #[serde(default)]
    pub status: UnitStatus,

    /// Optional context passed along to the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Source file the unit was imported from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl TranslationUnit {
    /// Create a new pending unit
    pub fn new(key: impl Into<String>, original_text: impl Into<String>) -> Self {
        let original_text = original_text.into();
        Self {
            key: key.into(),
            source_hash: Self::compute_hash(&original_text),
            original_text,
            translated_text: None,
            status: UnitStatus::Pending,
            context: None,
            file: None,
        }
    }

    /// Attach a source file name
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Attach provider context
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Hash used for change detection: SHA-256 of the whitespace-normalized text
    pub fn compute_hash(text: &str) -> String {
        let normalized = normalize_whitespace(text);
        let digest = Sha256::digest(normalized.as_bytes());
        let hex = format!("{:x}", digest);
        hex[..16].to_string()
    }

    /// Check whether a new source text differs from the current one
    pub fn needs_update(&self, new_text: &str) -> bool {
        Self::compute_hash(new_text) != self.source_hash
    }

    /// Replace the source text.
    ///
    /// Returns true when the content changed, in which case the unit is
    /// invalidated: the translation is dropped and the status goes back to
    /// pending.
    pub fn set_original_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if !self.needs_update(&text) {
            self.original_text = text;
            return false;
        }

        self.source_hash = Self::compute_hash(&text);
        self.original_text = text;
        self.translated_text = None;
        self.status = UnitStatus::Pending;
        true
    }

    /// Accept a translation
    pub fn apply_translation(&mut self, translation: impl Into<String>) {
        self.translated_text = Some(translation.into());
        self.status = UnitStatus::Translated;
    }

    /// Send the unit back to the translation queue, keeping the old text for reference
    pub fn mark_pending(&mut self) {
        self.status = UnitStatus::Pending;
    }

    /// Exclude the unit from translation
    pub fn mark_skipped(&mut self) {
        self.status = UnitStatus::Skipped;
    }

    /// Technical text is markup-only or numeric once markup is stripped
    pub fn is_technical(&self) -> bool {
        is_technical_text(&self.original_text)
    }
}

/// Collapse runs of whitespace into single spaces and trim
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text.trim(), " ").into_owned()
}

/// Whether a text carries no translatable content once markup is removed
pub fn is_technical_text(text: &str) -> bool {
    let stripped = TECHNICAL_MARKUP_REGEX.replace_all(text, "");
    let clean = stripped.trim();
    clean.chars().count() < 3 || clean.chars().all(|c| c.is_ascii_digit())
}

/// Translation progress statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressStats {
    pub total: usize,
    pub pending: usize,
    pub translated: usize,
    pub skipped: usize,
}

impl ProgressStats {
    /// Count statuses over a unit set
    pub fn from_units<'a>(units: impl IntoIterator<Item = &'a TranslationUnit>) -> Self {
        let mut stats = Self::default();
        for unit in units {
            stats.total += 1;
            match unit.status {
                UnitStatus::Pending => stats.pending += 1,
                UnitStatus::Translated => stats.translated += 1,
                UnitStatus::Skipped => stats.skipped += 1,
            }
        }
        stats
    }

    /// Percentage of units holding a translation
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.translated as f64 / self.total as f64 * 100.0
    }
}
