use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

use crate::file_utils::FileManager;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Project directory holding state, glossary and cache
    #[serde(default = "default_project_dir")]
    pub project_dir: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Pipeline config
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: OpenAI
    OpenAI,
    // @provider: OpenRouter (OpenAI-compatible hosted router)
    OpenRouter,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
    // @provider: Anthropic
    Anthropic,
}

impl TranslationProvider {
    /// Every supported provider
    pub const ALL: [TranslationProvider; 5] = [
        Self::Ollama,
        Self::OpenAI,
        Self::OpenRouter,
        Self::LMStudio,
        Self::Anthropic,
    ];

    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::OpenRouter => "OpenRouter",
            Self::LMStudio => "LM Studio",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::OpenRouter => "openrouter".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }

    // @returns: Whether requests need an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI | Self::OpenRouter | Self::Anthropic)
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "openrouter" => Ok(Self::OpenRouter),
            "lmstudio" => Ok(Self::LMStudio),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: default_model(provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(provider_type),
            timeout_secs: match provider_type {
                TranslationProvider::Anthropic => default_anthropic_timeout_secs(),
                _ => default_timeout_secs(),
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Total attempts per provider operation
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base retry delay in milliseconds, multiplied by the attempt number
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            temperature: default_temperature(),
        }
    }
}

/// Settings for one pipeline stage
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StageSettings {
    /// Worker count; the provider profile decides when unset
    #[serde(default)]
    pub threads: Option<usize>,

    /// Token budget per batch, prompt overhead included
    #[serde(default = "default_batch_tokens")]
    pub batch_tokens: usize,

    /// Attempt budget; the common retry count applies when unset
    #[serde(default)]
    pub max_retries: Option<u32>,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            threads: None,
            batch_tokens: default_batch_tokens(),
            max_retries: None,
        }
    }
}

/// Pipeline behaviour
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineSettings {
    #[serde(default)]
    pub extract: StageSettings,

    #[serde(default)]
    pub glossary: StageSettings,

    #[serde(default)]
    pub translate: StageSettings,

    /// Reuse extracted_terms.json instead of extracting again
    #[serde(default)]
    pub skip_extract: bool,

    /// Reuse glossary.json instead of translating terms again
    #[serde(default)]
    pub skip_glossary: bool,

    /// Send only the relevant glossary subset with each batch
    #[serde(default = "default_true")]
    pub smart_glossary: bool,

    /// Upper bound on glossary terms per batch
    #[serde(default)]
    pub max_glossary_terms: Option<usize>,

    /// Treat unchanged translations as errors
    #[serde(default)]
    pub strict_validation: bool,

    /// Downgrade translations with validation errors back to pending
    #[serde(default = "default_true")]
    pub revalidate: bool,

    /// Mark markup-only and numeric units as skipped
    #[serde(default = "default_true")]
    pub skip_technical: bool,

    /// Attempt budget for retry-failed passes
    #[serde(default = "default_retry_failed_max_retries")]
    pub retry_failed_max_retries: u32,

    /// Keep a failed glossary term as its own translation, still recorded as failed
    #[serde(default)]
    pub glossary_identity_fallback: bool,

    /// JSON file with extra markup patterns to validate
    #[serde(default)]
    pub custom_patterns: Option<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            extract: StageSettings::default(),
            glossary: StageSettings::default(),
            translate: StageSettings::default(),
            skip_extract: false,
            skip_glossary: false,
            smart_glossary: true,
            max_glossary_terms: None,
            strict_validation: false,
            revalidate: true,
            skip_technical: true,
            retry_failed_max_retries: default_retry_failed_max_retries(),
            glossary_identity_fallback: false,
            custom_patterns: None,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_project_dir() -> String {
    "project".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_anthropic_timeout_secs() -> u64 {
    120
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_retry_failed_max_retries() -> u32 {
    10
}

fn default_batch_tokens() -> usize {
    4000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_endpoint(provider: TranslationProvider) -> String {
    match provider {
        TranslationProvider::Ollama => "http://localhost:11434",
        TranslationProvider::OpenAI => "https://api.openai.com/v1",
        TranslationProvider::OpenRouter => "https://openrouter.ai/api/v1",
        // LM Studio default server (OpenAI compatible) runs on port 1234 under /v1
        TranslationProvider::LMStudio => "http://localhost:1234/v1",
        TranslationProvider::Anthropic => "https://api.anthropic.com",
    }
    .to_string()
}

fn default_model(provider: TranslationProvider) -> String {
    match provider {
        TranslationProvider::Ollama => "qwen2.5:14b",
        TranslationProvider::OpenAI => "gpt-4o-mini",
        TranslationProvider::OpenRouter => "openai/gpt-4o-mini",
        // Placeholder; users should set to the loaded model name in LM Studio
        TranslationProvider::LMStudio => "local-model",
        TranslationProvider::Anthropic => "claude-3-5-haiku-latest",
    }
    .to_string()
}

impl Config {
    /// Load a config file, writing the default one first when it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !FileManager::file_exists(path) {
            let config = Self::default();
            config.save(path)?;
            log::info!("Created default configuration at {:?}", path);
            return Ok(config);
        }

        FileManager::read_json(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))
    }

    /// Save the config as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        FileManager::write_json_atomic(path, self)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        crate::language_utils::validate_language_code(&self.source_language)?;
        crate::language_utils::validate_language_code(&self.target_language)?;

        if self.translation.provider.requires_api_key() && self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider",
                self.translation.provider.display_name()
            ));
        }

        for (name, stage) in [
            ("extract", &self.pipeline.extract),
            ("glossary", &self.pipeline.glossary),
            ("translate", &self.pipeline.translate),
        ] {
            if stage.batch_tokens <= crate::translation::batch::PROMPT_OVERHEAD_TOKENS {
                return Err(anyhow!(
                    "pipeline.{}.batch_tokens must exceed the {} token prompt overhead",
                    name,
                    crate::translation::batch::PROMPT_OVERHEAD_TOKENS
                ));
            }
            if stage.threads == Some(0) {
                return Err(anyhow!("pipeline.{}.threads must be at least 1", name));
            }
        }

        if let Some(path) = &self.pipeline.custom_patterns {
            if !FileManager::file_exists(path) {
                return Err(anyhow!("Custom patterns file not found: {}", path));
            }
        }

        Ok(())
    }

    /// Project directory as a path
    pub fn project_path(&self) -> PathBuf {
        PathBuf::from(&self.project_dir)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "uk".to_string(),
            project_dir: default_project_dir(),
            translation: TranslationConfig::default(),
            pipeline: PipelineSettings::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        default_model(self.provider)
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }

        // Local providers don't use API keys
        String::new()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        default_endpoint(self.provider)
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        match self.get_active_provider_config() {
            Some(provider_config) if provider_config.timeout_secs > 0 => provider_config.timeout_secs,
            _ => default_timeout_secs(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: TranslationProvider::ALL
                .into_iter()
                .map(ProviderConfig::new)
                .collect(),
            common: TranslationCommonConfig::default(),
        }
    }
}
