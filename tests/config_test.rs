// ABOUTME: Unit tests for translator and provider configuration loading
// ABOUTME: Validates environment overrides, key resolution, defaults, and validation errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use serial_test::serial;
use sqlwrite::config::{
    resolve_api_key, FeedbackStrategy, LogLevel, ModelPreset, ProviderConfig,
    TranslationFeatures, TranslatorConfig,
};
use sqlwrite::constants::env_vars;
use sqlwrite::errors::ErrorCode;
use sqlwrite::logging::{LogFormat, LoggingConfig};
use std::env;

const TRANSLATOR_VARS: [&str; 8] = [
    env_vars::MODEL,
    env_vars::MAX_RETRIES,
    env_vars::MAX_SHAPE_RETRIES,
    env_vars::LARGE_RESULT_THRESHOLD,
    env_vars::SAMPLE_VALUES,
    env_vars::SAMPLE_MAX_LEN,
    env_vars::FEATURES,
    env_vars::FEEDBACK,
];

fn clear_translator_vars() {
    for var in TRANSLATOR_VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear_translator_vars();

    let config = TranslatorConfig::from_env();

    assert_eq!(config, TranslatorConfig::default());
    assert_eq!(config.model, ModelPreset::default().model_id());
    assert_eq!(config.max_structural_retries, 3);
    assert_eq!(config.max_shape_retries, 5);
    assert_eq!(config.large_result_threshold, 10);
    assert_eq!(config.feedback, FeedbackStrategy::Silent);
    assert!(config.features.contains(TranslationFeatures::SHAPE_RETRY));
    assert!(!config.features.contains(TranslationFeatures::BACK_TRANSLATION));
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear_translator_vars();
    env::set_var(env_vars::MODEL, "gpt-4");
    env::set_var(env_vars::MAX_RETRIES, "7");
    env::set_var(env_vars::MAX_SHAPE_RETRIES, "2");
    env::set_var(env_vars::LARGE_RESULT_THRESHOLD, "25");
    env::set_var(env_vars::FEATURES, "samples, back_translation, bogus");
    env::set_var(env_vars::FEEDBACK, "append");

    let config = TranslatorConfig::from_env();
    clear_translator_vars();

    assert_eq!(config.model, "gpt-4");
    assert_eq!(config.max_structural_retries, 7);
    assert_eq!(config.max_shape_retries, 2);
    assert_eq!(config.large_result_threshold, 25);
    assert_eq!(
        config.features,
        TranslationFeatures::SAMPLE_VALUES | TranslationFeatures::BACK_TRANSLATION
    );
    assert_eq!(config.feedback, FeedbackStrategy::AppendToConversation);
}

#[test]
#[serial]
fn test_unparsable_numbers_fall_back() {
    clear_translator_vars();
    env::set_var(env_vars::MAX_RETRIES, "many");
    env::set_var(env_vars::LARGE_RESULT_THRESHOLD, "-1");

    let config = TranslatorConfig::from_env();
    clear_translator_vars();

    assert_eq!(config.max_structural_retries, 3);
    assert_eq!(config.large_result_threshold, 10);
}

#[test]
fn test_validate_rejects_unusable_values() {
    let empty_model = TranslatorConfig {
        model: "  ".to_owned(),
        ..TranslatorConfig::default()
    };
    assert_eq!(
        empty_model.validate().unwrap_err().code,
        ErrorCode::ConfigInvalid
    );

    let zero_len = TranslatorConfig {
        sample_value_max_len: 0,
        ..TranslatorConfig::default()
    };
    assert_eq!(zero_len.validate().unwrap_err().code, ErrorCode::ConfigInvalid);

    TranslatorConfig::default().validate().unwrap();
}

#[test]
#[serial]
fn test_api_key_resolution() {
    let var = "SQLWRITE_CONFIG_TEST_KEY";
    env::remove_var(var);

    assert_eq!(resolve_api_key(Some("sk-explicit"), var).unwrap(), "sk-explicit");
    assert_eq!(
        resolve_api_key(None, var).unwrap_err().code,
        ErrorCode::NoKeyDefined
    );

    env::set_var(var, "");
    assert_eq!(
        resolve_api_key(Some(""), var).unwrap_err().code,
        ErrorCode::NoKeyDefined
    );

    env::set_var(var, "sk-from-env");
    assert_eq!(resolve_api_key(None, var).unwrap(), "sk-from-env");
    assert_eq!(resolve_api_key(Some(""), var).unwrap(), "sk-from-env");
    env::remove_var(var);
}

#[test]
#[serial]
fn test_provider_base_url_override() {
    env::set_var(env_vars::BASE_URL, "http://localhost:8081/v1");
    let config = ProviderConfig::from_env();
    env::remove_var(env_vars::BASE_URL);

    assert_eq!(config.base_url, "http://localhost:8081/v1");
    assert_eq!(config.api_key_env, env_vars::OPENAI_API_KEY);
    assert_eq!(ProviderConfig::from_env(), ProviderConfig::default());
}

#[test]
#[serial]
fn test_logging_config_from_env() {
    env::set_var(env_vars::LOG_FORMAT, "json");
    env::remove_var(env_vars::LOG_LOCATION);
    let config = LoggingConfig::from_env().with_level(LogLevel::Debug);
    env::remove_var(env_vars::LOG_FORMAT);

    assert_eq!(config.format, LogFormat::Json);
    assert!(!config.include_location);
    assert_eq!(config.level, "debug");
    assert_eq!(config.service_name, "sqlwrite");
}
