/*!
 * On-disk layout of a translation project.
 *
 * ```text
 * <root>/
 *   project_state.json
 *   PROJECT_CONTEXT.md            optional, passed to the provider
 *   glossary/extracted_terms.json
 *   glossary/glossary.json
 *   cache/translation_cache.json
 * ```
 *
 * Every write goes through a temp file and a rename.
 */

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use log::{debug, info};

use crate::file_utils::FileManager;
use crate::translation::cache::TranslationCache;
use crate::translation::glossary::Glossary;
use super::state::ProjectState;
use super::terms::ExtractedTerms;

const STATE_FILE: &str = "project_state.json";
const CONTEXT_FILE: &str = "PROJECT_CONTEXT.md";
const GLOSSARY_DIR: &str = "glossary";
const EXTRACTED_TERMS_FILE: &str = "extracted_terms.json";
const GLOSSARY_FILE: &str = "glossary.json";
const CACHE_DIR: &str = "cache";
const CACHE_FILE: &str = "translation_cache.json";

/// Paths and persistence of one project directory
#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join(STATE_FILE)
    }

    pub fn context_path(&self) -> PathBuf {
        self.root.join(CONTEXT_FILE)
    }

    pub fn extracted_terms_path(&self) -> PathBuf {
        self.root.join(GLOSSARY_DIR).join(EXTRACTED_TERMS_FILE)
    }

    pub fn glossary_path(&self) -> PathBuf {
        self.root.join(GLOSSARY_DIR).join(GLOSSARY_FILE)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.root.join(CACHE_DIR).join(CACHE_FILE)
    }

    pub fn is_initialized(&self) -> bool {
        FileManager::file_exists(self.state_path())
    }

    /// Create the directory layout and an empty state if there is none.
    ///
    /// An existing project keeps its state; its languages must match.
    pub fn init(&self, source_language: &str, target_language: &str) -> Result<ProjectState> {
        FileManager::ensure_dir(self.root.join(GLOSSARY_DIR))?;
        FileManager::ensure_dir(self.root.join(CACHE_DIR))?;

        if self.is_initialized() {
            let state = self.load_state()?;
            if state.source_language != source_language || state.target_language != target_language {
                return Err(anyhow!(
                    "Project at {:?} translates {} -> {}, not {} -> {}",
                    self.root,
                    state.source_language,
                    state.target_language,
                    source_language,
                    target_language
                ));
            }
            return Ok(state);
        }

        let state = ProjectState::new(source_language, target_language);
        self.save_state(&state)?;
        info!("Initialized project at {:?}", self.root);
        Ok(state)
    }

    pub fn load_state(&self) -> Result<ProjectState> {
        let path = self.state_path();
        if !FileManager::file_exists(&path) {
            return Err(anyhow!("Project not initialized: {:?} does not exist", path));
        }
        FileManager::read_json(&path).with_context(|| format!("Failed to load project state from {:?}", path))
    }

    pub fn save_state(&self, state: &ProjectState) -> Result<()> {
        debug!("Saving project state ({} units)", state.units.len());
        FileManager::write_json_atomic(self.state_path(), state)
    }

    /// Extracted terms, empty when the extraction stage never ran
    pub fn load_terms(&self) -> Result<ExtractedTerms> {
        FileManager::read_json_or_default(self.extracted_terms_path())
            .with_context(|| format!("Failed to load {:?}", self.extracted_terms_path()))
    }

    pub fn save_terms(&self, terms: &ExtractedTerms) -> Result<()> {
        FileManager::write_json_atomic(self.extracted_terms_path(), terms)
    }

    pub fn load_glossary(&self) -> Result<Glossary> {
        Glossary::load(self.glossary_path())
    }

    pub fn save_glossary(&self, glossary: &Glossary) -> Result<()> {
        glossary.save(self.glossary_path())
    }

    pub fn open_cache(&self) -> Result<TranslationCache> {
        TranslationCache::load(self.cache_path())
    }

    /// Free-form project context for the provider, if present
    pub fn load_context(&self) -> Result<Option<String>> {
        let path = self.context_path();
        if !FileManager::file_exists(&path) {
            return Ok(None);
        }
        let content = FileManager::read_to_string(&path)?;
        let content = content.trim();
        Ok((!content.is_empty()).then(|| content.to_string()))
    }
}
