/*!
 * Project-specific markup patterns.
 *
 * A patterns file names extra markup classes that must survive translation
 * the same way the built-in ones do:
 *
 * ```json
 * {
 *   "patterns": {
 *     "square_brackets": {"pattern": "\\[\\w+\\]", "description": "Markers like [ACTION]"},
 *     "special_ids": {"pattern": "#\\d{4,6}", "enabled": false}
 *   }
 * }
 * ```
 *
 * Disabled entries and entries whose regex does not compile are skipped.
 */

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use regex::Regex;
use serde::Deserialize;

use crate::file_utils::FileManager;
use super::markup::MarkupDiff;

/// One named markup class
#[derive(Debug, Clone)]
pub struct CustomPattern {
    pub name: String,
    pub description: String,
    regex: Regex,
}

#[derive(Debug, Deserialize)]
struct PatternsFile {
    #[serde(default)]
    patterns: BTreeMap<String, PatternEntry>,
}

#[derive(Debug, Deserialize)]
struct PatternEntry {
    #[serde(default)]
    pattern: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl CustomPattern {
    pub fn new(name: &str, pattern: &str, description: Option<&str>) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.to_string(),
            description: description
                .map(str::to_string)
                .unwrap_or_else(|| format!("Custom pattern: {}", name)),
            regex: Regex::new(pattern)?,
        })
    }

    /// Load the enabled patterns of a JSON patterns file, sorted by name
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Vec<Self>> {
        let path = path.as_ref();
        let file: PatternsFile = FileManager::read_json(path)
            .with_context(|| format!("Failed to load custom patterns from {:?}", path))?;
        let patterns = Self::from_entries(file.patterns);
        info!("Loaded {} custom validation patterns from {:?}", patterns.len(), path);
        Ok(patterns)
    }

    fn from_entries(entries: BTreeMap<String, PatternEntry>) -> Vec<Self> {
        entries
            .into_iter()
            .filter(|(_, entry)| entry.enabled && !entry.pattern.is_empty())
            .filter_map(|(name, entry)| {
                match Self::new(&name, &entry.pattern, entry.description.as_deref()) {
                    Ok(pattern) => Some(pattern),
                    Err(e) => {
                        warn!("Skipping invalid custom pattern '{}' ({}): {}", name, entry.pattern, e);
                        None
                    }
                }
            })
            .collect()
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// All matches in `text`, in order
    pub fn extract(&self, text: &str) -> Vec<String> {
        self.regex.find_iter(text).map(|m| m.as_str().to_string()).collect()
    }

    pub fn compare(&self, source: &str, translated: &str) -> MarkupDiff {
        MarkupDiff::between(&self.extract(source), &self.extract(translated))
    }
}
