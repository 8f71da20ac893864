/*!
 * Tests for configuration loading, defaults and validation
 */

use anyhow::Result;
use std::str::FromStr;

use subtran::app_config::{
    BatchMismatchPolicy, Config, LogLevel, ProcessingMode, TranslationProvider,
};

use crate::common;

#[test]
fn test_default_config_shouldBeValid() -> Result<()> {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.translation.common.processing_mode, ProcessingMode::Individual);
    assert_eq!(config.translation.common.batch_mismatch_policy, BatchMismatchPolicy::Abort);
    assert_eq!(config.translation.common.word_limit, 250);
    assert!(config.translation.serialize_requests());
    config.validate()?;
    Ok(())
}

#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let created = Config::load_or_create(&path)?;
    assert!(path.exists());

    let loaded = Config::load_or_create(&path)?;
    assert_eq!(loaded.target_language, created.target_language);
    assert_eq!(loaded.translation.get_model(), created.translation.get_model());
    assert_eq!(loaded.translation.available_providers.len(), 2);
    Ok(())
}

#[test]
fn test_load_withPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
            "source_language": "en",
            "target_language": "es",
            "translation": {
                "provider": "anthropic",
                "available_providers": [
                    { "type": "anthropic", "api_key": "sk-test" }
                ],
                "common": {
                    "processing_mode": "batch",
                    "batch_size": 10,
                    "batch_mismatch_policy": "retry_individually"
                }
            },
            "log_level": "debug"
        }"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.translation.provider, TranslationProvider::Anthropic);
    assert_eq!(config.translation.common.processing_mode, ProcessingMode::Batch);
    assert_eq!(config.translation.common.batch_size, 10);
    assert_eq!(
        config.translation.common.batch_mismatch_policy,
        BatchMismatchPolicy::RetryIndividually
    );
    assert_eq!(config.translation.common.retry_count, 3);
    assert_eq!(config.translation.get_api_key(), "sk-test");
    assert_eq!(config.translation.get_endpoint(), "https://api.anthropic.com");
    assert_eq!(config.translation.get_model(), "claude-3-haiku-20240307");
    assert_eq!(config.log_level, LogLevel::Debug);
    config.validate()?;
    Ok(())
}

#[test]
fn test_load_withBrokenJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_validate_withBadValues_shouldFail() {
    let mut config = Config::default();
    config.target_language = "xx-invalid".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.translation.common.batch_size = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.translation.common.temperature = 1.5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.translation.active_provider_config_mut().endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withSameLanguages_shouldFail() {
    let mut config = Config::default();
    config.target_language = "eng".to_string();
    assert!(config.validate().is_err());

    config.target_language = "de".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withAnthropicAndNoKey_shouldFail() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Anthropic;
    assert!(config.validate().is_err());

    config.translation.active_provider_config_mut().api_key = "sk-test".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_active_provider_config_mut_withMissingEntry_shouldAddDefaults() {
    let mut config = Config::default();
    config.translation.available_providers.clear();
    config.translation.provider = TranslationProvider::Anthropic;

    config.translation.active_provider_config_mut().model = "custom".to_string();

    assert_eq!(config.translation.available_providers.len(), 1);
    assert_eq!(config.translation.get_model(), "custom");
    assert_eq!(config.translation.get_rate_limit(), Some(45));
}

#[test]
fn test_provider_from_str_shouldIgnoreCase() -> Result<()> {
    assert_eq!(TranslationProvider::from_str("Ollama")?, TranslationProvider::Ollama);
    assert_eq!(TranslationProvider::from_str("ANTHROPIC")?, TranslationProvider::Anthropic);
    assert!(TranslationProvider::from_str("openai").is_err());
    Ok(())
}

#[test]
fn test_log_level_shouldMapToFilter() {
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
