/*!
 * Translation caching functionality.
 *
 * This module provides a content-addressed cache that avoids repeated
 * provider calls for text that was already translated under the same
 * language pair and glossary. Entries are persisted as a flat
 * `{hash: translation}` JSON document.
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Context, Result};
use log::{debug, info};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use crate::file_utils::FileManager;
use super::unit::normalize_whitespace;

/// Derive the cache key for a text under a language pair and glossary
pub fn cache_key(text: &str, source_language: &str, target_language: &str, glossary_hash: &str) -> String {
    let normalized = normalize_whitespace(text);
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hasher.update(b"|");
    hasher.update(source_language.as_bytes());
    hasher.update(b"|");
    hasher.update(target_language.as_bytes());
    hasher.update(b"|");
    hasher.update(glossary_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Translation cache for storing and retrieving translations
#[derive(Clone)]
pub struct TranslationCache {
    /// Internal cache storage
    entries: Arc<RwLock<HashMap<String, String>>>,

    /// Backing file, `None` for an in-memory cache
    path: Option<PathBuf>,

    /// Set when entries were added since the last flush
    dirty: Arc<AtomicBool>,

    hits: Arc<AtomicUsize>,
    misses: Arc<AtomicUsize>,
}

impl TranslationCache {
    /// Create a cache that is never persisted
    pub fn in_memory() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            path: None,
            dirty: Arc::new(AtomicBool::new(false)),
            hits: Arc::new(AtomicUsize::new(0)),
            misses: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Load a cache from disk, starting empty when the file does not exist yet
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries: HashMap<String, String> = FileManager::read_json_or_default(&path)
            .with_context(|| format!("Failed to load translation cache from {:?}", path))?;

        info!("Loaded {} cached translations from {:?}", entries.len(), path);

        let mut cache = Self::in_memory();
        cache.entries = Arc::new(RwLock::new(entries));
        cache.path = Some(path);
        Ok(cache)
    }

    /// Get a translation from the cache
    pub fn get(&self, text: &str, source_language: &str, target_language: &str, glossary_hash: &str) -> Option<String> {
        let key = cache_key(text, source_language, target_language, glossary_hash);
        self.get_by_key(&key, text)
    }

    /// Look up a precomputed key
    pub fn get_by_key(&self, key: &str, text_for_log: &str) -> Option<String> {
        let entries = self.entries.read();
        match entries.get(key) {
            Some(translation) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for '{}'", truncate_text(text_for_log, 30));
                Some(translation.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a translation. Existing entries are never overwritten.
    pub fn put(&self, text: &str, source_language: &str, target_language: &str, glossary_hash: &str, translation: &str) {
        let key = cache_key(text, source_language, target_language, glossary_hash);
        self.put_by_key(key, translation);
    }

    /// Store a translation under a precomputed key
    pub fn put_by_key(&self, key: String, translation: &str) {
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return;
        }
        entries.insert(key, translation.to_string());
        self.dirty.store(true, Ordering::Release);
    }

    /// Drop an entry that no longer passes validation
    pub fn evict(&self, key: &str) -> bool {
        let removed = self.entries.write().remove(key).is_some();
        if removed {
            self.dirty.store(true, Ordering::Release);
        }
        removed
    }

    /// Persist the cache if anything changed since the last flush
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        let snapshot = self.entries.read().clone();
        if let Err(e) = FileManager::write_json_atomic(path, &snapshot) {
            self.dirty.store(true, Ordering::Release);
            return Err(e.context("Failed to flush translation cache"));
        }

        debug!("Flushed {} cache entries to {:?}", snapshot.len(), path);
        Ok(())
    }

    /// Final flush at the end of a run
    pub fn close(&self) -> Result<()> {
        self.flush()?;
        let (hits, misses, hit_rate) = self.stats();
        info!(
            "Translation cache closed: {} entries, {} hits, {} misses ({:.1}% hit rate)",
            self.len(), hits, misses, hit_rate * 100.0
        );
        Ok(())
    }

    /// Get cache statistics
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whether unflushed entries exist
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Truncate text to a maximum length with ellipsis
fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let prefix: String = text.chars().take(max_chars).collect();
        format!("{}...", prefix)
    }
}
