/*!
 * Persistent unit state of a translation project.
 */

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::translation::ledger::{FailureLedger, FailureRecord};
use crate::translation::unit::{ProgressStats, TranslationUnit, UnitStatus};

/// Contents of `project_state.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectState {
    pub source_language: String,
    pub target_language: String,

    /// Units in import order
    #[serde(default)]
    pub units: Vec<TranslationUnit>,

    /// Ledger of the content translation stage
    #[serde(default)]
    pub failed_units: Vec<FailureRecord>,
}

/// Outcome of a source import
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl ProjectState {
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            units: Vec::new(),
            failed_units: Vec::new(),
        }
    }

    fn positions(&self) -> HashMap<String, usize> {
        self.units
            .iter()
            .enumerate()
            .map(|(position, unit)| (unit.key.clone(), position))
            .collect()
    }

    pub fn unit(&self, key: &str) -> Option<&TranslationUnit> {
        self.units.iter().find(|unit| unit.key == key)
    }

    pub fn unit_mut(&mut self, key: &str) -> Option<&mut TranslationUnit> {
        self.units.iter_mut().find(|unit| unit.key == key)
    }

    /// Import source units with change detection.
    ///
    /// New keys are appended. A known key whose normalized text changed is
    /// invalidated back to pending. Anything else is left alone.
    pub fn import_units(&mut self, incoming: impl IntoIterator<Item = TranslationUnit>) -> ImportSummary {
        let mut positions = self.positions();
        let mut summary = ImportSummary::default();

        for unit in incoming {
            match positions.get(&unit.key) {
                Some(&position) => {
                    let existing = &mut self.units[position];
                    if existing.set_original_text(unit.original_text) {
                        debug!("Source of '{}' changed, back to pending", existing.key);
                        summary.updated += 1;
                    } else {
                        summary.unchanged += 1;
                    }
                    if unit.context.is_some() {
                        existing.context = unit.context;
                    }
                    if unit.file.is_some() {
                        existing.file = unit.file;
                    }
                }
                None => {
                    positions.insert(unit.key.clone(), self.units.len());
                    self.units.push(unit);
                    summary.new += 1;
                }
            }
        }

        info!(
            "Imported units: {} new, {} updated, {} unchanged",
            summary.new, summary.updated, summary.unchanged
        );
        summary
    }

    /// Import a flat `{key: text}` map as units from `file`
    pub fn import_source_map(&mut self, entries: &BTreeMap<String, String>, file: Option<&str>) -> ImportSummary {
        let units: Vec<TranslationUnit> = entries
            .iter()
            .map(|(key, text)| {
                let unit = TranslationUnit::new(key.as_str(), text.as_str());
                match file {
                    Some(file) => unit.with_file(file),
                    None => unit,
                }
            })
            .collect();
        self.import_units(units)
    }

    /// Apply existing translations to pending units, or to all known units
    /// when `overwrite` is set. Returns the number applied.
    pub fn import_translations(&mut self, translations: &BTreeMap<String, String>, overwrite: bool) -> usize {
        let mut imported = 0;
        for unit in &mut self.units {
            let Some(translation) = translations.get(&unit.key) else {
                continue;
            };
            if translation.trim().is_empty() {
                continue;
            }
            if unit.status == UnitStatus::Pending || overwrite {
                unit.apply_translation(translation.clone());
                imported += 1;
            }
        }
        imported
    }

    /// Accept translations by unit key. Returns the number applied.
    pub fn apply_translations(&mut self, translations: &HashMap<String, String>) -> usize {
        let mut applied = 0;
        for unit in &mut self.units {
            if let Some(translation) = translations.get(&unit.key) {
                unit.apply_translation(translation.clone());
                applied += 1;
            }
        }
        applied
    }

    /// Mark pending technical units as skipped. Returns the number marked.
    pub fn skip_technical(&mut self) -> usize {
        let mut skipped = 0;
        for unit in &mut self.units {
            if unit.status == UnitStatus::Pending && unit.is_technical() {
                unit.mark_skipped();
                skipped += 1;
            }
        }
        if skipped > 0 {
            info!("Skipped {} technical units", skipped);
        }
        skipped
    }

    /// Pending units, in import order
    pub fn pending_units(&self) -> Vec<TranslationUnit> {
        self.units
            .iter()
            .filter(|unit| unit.status == UnitStatus::Pending)
            .cloned()
            .collect()
    }

    /// Pending units among `keys`, in import order
    pub fn pending_units_among(&self, keys: &[String]) -> Vec<TranslationUnit> {
        let keys: HashSet<&str> = keys.iter().map(String::as_str).collect();
        self.units
            .iter()
            .filter(|unit| unit.status == UnitStatus::Pending && keys.contains(unit.key.as_str()))
            .cloned()
            .collect()
    }

    /// Accepted translations as a flat map
    pub fn translations(&self) -> BTreeMap<String, String> {
        self.units
            .iter()
            .filter(|unit| unit.status == UnitStatus::Translated)
            .filter_map(|unit| unit.translated_text.clone().map(|text| (unit.key.clone(), text)))
            .collect()
    }

    pub fn progress(&self) -> ProgressStats {
        ProgressStats::from_units(&self.units)
    }

    /// The content stage ledger
    pub fn ledger(&self) -> FailureLedger {
        FailureLedger::from_records(self.failed_units.clone())
    }

    pub fn set_ledger(&mut self, ledger: &FailureLedger) {
        self.failed_units = ledger.records();
    }
}
