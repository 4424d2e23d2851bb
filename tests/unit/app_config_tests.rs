/*!
 * Tests for app configuration functionality
 */

use loctrans::app_config::{Config, LogLevel, ProviderConfig, TranslationProvider};
use loctrans::translation::concurrency::ProviderProfile;
use loctrans::translation::pipeline::PipelineConfig;

use crate::common::create_temp_dir;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "uk");
    assert_eq!(config.project_dir, "project");
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.translation.available_providers.len(), 5);
    assert_eq!(config.translation.common.retry_count, 3);
    assert_eq!(config.pipeline.translate.batch_tokens, 4000);
    assert!(config.pipeline.smart_glossary);
    assert!(config.pipeline.revalidate);
    assert!(!config.pipeline.glossary_identity_fallback);
    assert_eq!(config.pipeline.retry_failed_max_retries, 10);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    config.target_language = "klingon".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Anthropic;
    assert!(config.validate().is_err(), "Anthropic without API key must fail");

    let mut config = Config::default();
    config.translation.provider = TranslationProvider::OpenAI;
    for provider in config.translation.available_providers.iter_mut() {
        if provider.provider_type == "openai" {
            provider.api_key = "sk-test".to_string();
        }
    }
    assert!(config.validate().is_ok());

    let mut config = Config::default();
    config.pipeline.glossary.batch_tokens = 1000;
    assert!(config.validate().is_err(), "Budget must exceed the prompt overhead");

    let mut config = Config::default();
    config.pipeline.extract.threads = Some(0);
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.pipeline.custom_patterns = Some("/nonexistent/patterns.json".to_string());
    assert!(config.validate().is_err(), "Custom patterns file must exist");
}

#[test]
fn test_deserialize_withPartialConfig_shouldFillDefaults() {
    let json = r#"{
        "source_language": "en",
        "target_language": "pt-BR",
        "translation": { "provider": "openrouter" },
        "pipeline": { "translate": { "threads": 6 }, "skip_extract": true }
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.translation.provider, TranslationProvider::OpenRouter);
    assert_eq!(config.translation.get_endpoint(), "https://openrouter.ai/api/v1");
    assert_eq!(config.translation.get_model(), "openai/gpt-4o-mini");
    assert_eq!(config.pipeline.translate.threads, Some(6));
    assert_eq!(config.pipeline.translate.batch_tokens, 4000);
    assert!(config.pipeline.skip_extract);
    assert!(!config.pipeline.skip_glossary);
}

#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefault() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path).unwrap();

    assert!(path.exists());
    let reloaded = Config::load_or_create(&path).unwrap();
    assert_eq!(reloaded.target_language, config.target_language);
    assert_eq!(reloaded.translation.available_providers.len(), 5);
}

#[test]
fn test_providerConfig_new_shouldUseProviderDefaults() {
    let anthropic = ProviderConfig::new(TranslationProvider::Anthropic);
    assert_eq!(anthropic.provider_type, "anthropic");
    assert_eq!(anthropic.endpoint, "https://api.anthropic.com");
    assert_eq!(anthropic.timeout_secs, 120);

    let lmstudio = ProviderConfig::new(TranslationProvider::LMStudio);
    assert_eq!(lmstudio.endpoint, "http://localhost:1234/v1");
}

#[test]
fn test_providerProfiles_shouldRespectOverrides() {
    let ollama = ProviderProfile::for_provider(TranslationProvider::Ollama);
    let openai = ProviderProfile::for_provider(TranslationProvider::OpenAI);

    assert_eq!(ollama.effective_concurrent_requests(None), 2);
    assert_eq!(openai.effective_concurrent_requests(None), 10);
    assert_eq!(openai.effective_concurrent_requests(Some(3)), 3);
    assert_eq!(openai.effective_concurrent_requests(Some(0)), 1);
}

#[test]
fn test_pipelineConfig_fromConfig_shouldApplyStageOverrides() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Anthropic;
    config.pipeline.extract.max_retries = Some(7);
    config.pipeline.translate.batch_tokens = 2500;
    config.pipeline.max_glossary_terms = Some(40);

    let pipeline = PipelineConfig::from_config(&config);

    assert_eq!(pipeline.extract.workers, 5);
    assert_eq!(pipeline.extract.max_retries, 7);
    assert_eq!(pipeline.glossary.max_retries, 3);
    assert_eq!(pipeline.translate.batch_tokens, 2500);
    assert_eq!(pipeline.max_glossary_terms, Some(40));
    assert!(pipeline.context.is_none());
}

#[test]
fn test_provider_fromStr_shouldBeCaseInsensitive() {
    assert_eq!("LMStudio".parse::<TranslationProvider>().unwrap(), TranslationProvider::LMStudio);
    assert!("gemini".parse::<TranslationProvider>().is_err());
}
