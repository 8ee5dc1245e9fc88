// ABOUTME: Typed configuration for the translation orchestrator and the model transport
// ABOUTME: Loads retry budgets, sampling limits, and feature flags from SQLWRITE_* variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use super::types::{FeedbackStrategy, ModelPreset};
use crate::constants::{env_vars, limits, network};
use crate::errors::{AppError, AppResult, ErrorCode};

bitflags::bitflags! {
    /// Optional stages of the translation pipeline
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TranslationFeatures: u8 {
        /// Include existing indexes in the prompt and print index suggestions
        const INDEX_SUGGESTIONS = 0b0000_0001;
        /// Include sampled text values in the prompt
        const SAMPLE_VALUES = 0b0000_0010;
        /// Restate the chosen SQL in natural language after rendering
        const BACK_TRANSLATION = 0b0000_0100;
        /// Re-ask with a mutated question when the row count is out of range
        const SHAPE_RETRY = 0b0000_1000;
    }
}

impl Default for TranslationFeatures {
    fn default() -> Self {
        Self::INDEX_SUGGESTIONS | Self::SAMPLE_VALUES | Self::SHAPE_RETRY
    }
}

impl TranslationFeatures {
    /// Parse a comma-separated feature list such as `indexes,samples,shape`
    ///
    /// Unknown names are logged and skipped.
    #[must_use]
    pub fn parse_list(list: &str) -> Self {
        let mut features = Self::empty();
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match name.to_lowercase().as_str() {
                "indexes" | "index_suggestions" => features |= Self::INDEX_SUGGESTIONS,
                "samples" | "sample_values" => features |= Self::SAMPLE_VALUES,
                "back_translation" | "backtranslate" | "verify" => {
                    features |= Self::BACK_TRANSLATION;
                }
                "shape" | "shape_retry" => features |= Self::SHAPE_RETRY,
                other => warn!("Ignoring unknown feature '{other}' in {}", env_vars::FEATURES),
            }
        }
        features
    }
}

/// Configuration for one orchestrated translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Model identifier sent to the provider
    pub model: String,
    /// Structural/validity retry budget of one `send()`
    pub max_structural_retries: u32,
    /// Shape-driven outer iterations
    pub max_shape_retries: u32,
    /// Row count at or above which a result is too large
    pub large_result_threshold: usize,
    /// Distinct values drawn per text column
    pub sample_values_per_column: u32,
    /// Characters kept per sampled value
    pub sample_value_max_len: usize,
    /// Enabled optional stages
    pub features: TranslationFeatures,
    /// Handling of validator rejections before a retry
    pub feedback: FeedbackStrategy,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            model: ModelPreset::default().model_id().to_owned(),
            max_structural_retries: limits::DEFAULT_MAX_RETRIES,
            max_shape_retries: limits::DEFAULT_MAX_SHAPE_RETRIES,
            large_result_threshold: limits::DEFAULT_LARGE_RESULT_THRESHOLD,
            sample_values_per_column: limits::DEFAULT_SAMPLE_VALUES,
            sample_value_max_len: limits::DEFAULT_SAMPLE_MAX_LEN,
            features: TranslationFeatures::default(),
            feedback: FeedbackStrategy::default(),
        }
    }
}

impl TranslatorConfig {
    /// Load configuration from `SQLWRITE_*` environment variables
    ///
    /// Unset or unparsable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let model = env::var(env_vars::MODEL)
            .ok()
            .filter(|m| !m.is_empty())
            .map_or(defaults.model, |m| {
                ModelPreset::parse(&m).map_or(m, |preset| preset.model_id().to_owned())
            });

        Self {
            model,
            max_structural_retries: env_parse_or(
                env_vars::MAX_RETRIES,
                defaults.max_structural_retries,
            ),
            max_shape_retries: env_parse_or(env_vars::MAX_SHAPE_RETRIES, defaults.max_shape_retries),
            large_result_threshold: env_parse_or(
                env_vars::LARGE_RESULT_THRESHOLD,
                defaults.large_result_threshold,
            ),
            sample_values_per_column: env_parse_or(
                env_vars::SAMPLE_VALUES,
                defaults.sample_values_per_column,
            ),
            sample_value_max_len: env_parse_or(
                env_vars::SAMPLE_MAX_LEN,
                defaults.sample_value_max_len,
            ),
            features: env::var(env_vars::FEATURES)
                .map_or(defaults.features, |list| TranslationFeatures::parse_list(&list)),
            feedback: env::var(env_vars::FEEDBACK)
                .map_or(defaults.feedback, |s| FeedbackStrategy::from_str_or_default(&s)),
        }
    }

    /// Select a model preset
    #[must_use]
    pub fn with_preset(mut self, preset: ModelPreset) -> Self {
        preset.model_id().clone_into(&mut self.model);
        self
    }

    /// Enable or disable a feature
    #[must_use]
    pub fn with_feature(mut self, feature: TranslationFeatures, enabled: bool) -> Self {
        self.features.set(feature, enabled);
        self
    }

    /// Check the configuration for values the pipeline cannot work with
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` when the model is empty or a threshold is zero.
    pub fn validate(&self) -> AppResult<()> {
        if self.model.trim().is_empty() {
            return Err(AppError::new(
                ErrorCode::ConfigInvalid,
                "model identifier must not be empty",
            ));
        }
        if self.large_result_threshold == 0 {
            return Err(AppError::new(
                ErrorCode::ConfigInvalid,
                "large_result_threshold must be greater than zero",
            ));
        }
        if self.sample_value_max_len == 0 {
            return Err(AppError::new(
                ErrorCode::ConfigInvalid,
                "sample_value_max_len must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Transport configuration for the model provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Environment variable consulted for the API key
    pub api_key_env: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Whole-request timeout
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: network::DEFAULT_BASE_URL.to_owned(),
            api_key_env: env_vars::OPENAI_API_KEY.to_owned(),
            connect_timeout: Duration::from_secs(network::CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(network::REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ProviderConfig {
    /// Load transport configuration from the environment
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var(env_vars::BASE_URL)
                .ok()
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.base_url),
            ..defaults
        }
    }
}

/// Resolve the API key from an explicit value or the named environment variable
///
/// Empty strings count as absent.
///
/// # Errors
///
/// Returns `NoKeyDefined` naming `key_name` when neither source yields a key.
pub fn resolve_api_key(explicit: Option<&str>, key_name: &str) -> AppResult<String> {
    explicit
        .filter(|key| !key.is_empty())
        .map(ToOwned::to_owned)
        .or_else(|| env::var(key_name).ok().filter(|key| !key.is_empty()))
        .ok_or_else(|| AppError::no_key_defined(key_name))
}

fn env_parse_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}
