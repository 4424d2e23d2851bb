/*!
 * Common test utilities for the loctrans test suite
 */

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

use loctrans::project::ProjectStore;
use loctrans::translation::TranslationUnit;

/// Route library logs to the test output, once per process
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// `count` units of `chars` characters each, keyed `unit.N`
pub fn sized_units(count: usize, chars: usize) -> Vec<TranslationUnit> {
    (0..count)
        .map(|i| {
            let prefix = format!("Line {} ", i);
            let text = format!("{}{}", prefix, "a".repeat(chars.saturating_sub(prefix.len())));
            TranslationUnit::new(format!("unit.{}", i), text)
        })
        .collect()
}

/// Small localization sample spread over two files
pub fn sample_source() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![
        ("act1.json", "menu.start", "Start the journey with Hornet"),
        ("act1.json", "menu.quit", "Quit to the Moss Grotto"),
        ("act1.json", "hud.coins", "You have {coins} coins"),
        ("act2.json", "dialog.bell", "The <b>Bell</b> rings for {name}"),
        ("act2.json", "dialog.silk", "Silk spools are rare"),
    ]
}

/// Create an initialized project holding `sample_source`
pub fn sample_project(dir: &Path) -> Result<ProjectStore> {
    let store = ProjectStore::new(dir.join("project"));
    let mut state = store.init("en", "uk")?;

    let mut by_file: BTreeMap<&str, BTreeMap<String, String>> = BTreeMap::new();
    for (file, key, text) in sample_source() {
        by_file.entry(file).or_default().insert(key.to_string(), text.to_string());
    }
    for (file, entries) in &by_file {
        state.import_source_map(entries, Some(file));
    }

    store.save_state(&state)?;
    Ok(store)
}
