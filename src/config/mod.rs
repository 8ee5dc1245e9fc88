// ABOUTME: Configuration management module for translation, transport, and logging settings
// ABOUTME: Re-exports typed configuration structures loaded from SQLWRITE_* environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

//! Configuration module for SQLwrite
//!
//! - **Translator**: retry budgets, sampling limits, and optional pipeline stages
//! - **Provider**: transport endpoint, API key variable, and timeouts
//! - **Types**: shared enums for log levels, model presets, and validator feedback

/// Translator and provider configuration
pub mod translator;
/// Shared configuration enums
pub mod types;

pub use translator::{resolve_api_key, ProviderConfig, TranslationFeatures, TranslatorConfig};
pub use types::{FeedbackStrategy, LogLevel, ModelPreset};
