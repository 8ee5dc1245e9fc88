// ABOUTME: Conversation client that accumulates messages, dispatches them, and retries bad output
// ABOUTME: Owns the message history and token usage of one translation request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

//! # Conversation Client
//!
//! [`ConversationClient`] wraps an [`LlmProvider`] with the state one
//! translation request needs:
//!
//! - an ordered message history, cleared with [`ConversationClient::reset_conversation`]
//! - cumulative [`UsageStats`] that survive resets
//! - a pluggable [`ResponseValidator`]
//! - a bounded structural retry loop in [`ConversationClient::send`]
//!
//! A retry budget of `N` allows at most `N + 1` attempts. Malformed JSON and
//! validator rejections draw from the same budget. Authentication failures are
//! fatal and never retried; other transport errors propagate unchanged without
//! consuming budget.

mod validator;

pub use validator::{require_string_field, AcceptAll, FnValidator, ResponseValidator};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{resolve_api_key, FeedbackStrategy, ProviderConfig, TranslatorConfig};
use crate::errors::{AppError, AppResult, ErrorCode, ValidationError};
use crate::llm::{
    ChatMessage, ChatRequest, LlmProvider, MessageRole, OpenAiCompatibleProvider, TokenUsage,
};

/// Cumulative token counters of one client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    /// Prompt tokens billed
    pub prompt_tokens: u64,
    /// Completion tokens billed
    pub completion_tokens: u64,
    /// Total tokens billed
    pub total_tokens: u64,
}

impl UsageStats {
    /// Add one call's usage
    pub fn record(&mut self, usage: TokenUsage) {
        self.prompt_tokens += u64::from(usage.prompt_tokens);
        self.completion_tokens += u64::from(usage.completion_tokens);
        self.total_tokens += u64::from(usage.total_tokens);
    }
}

/// Message-accumulating client with validation and bounded retries
pub struct ConversationClient {
    provider: Arc<dyn LlmProvider>,
    model: String,
    messages: Vec<ChatMessage>,
    usage: UsageStats,
    validator: Arc<dyn ResponseValidator>,
    max_retries: u32,
    feedback: FeedbackStrategy,
    last_retry_count: u32,
}

impl ConversationClient {
    /// Create a client over an existing provider
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, config: &TranslatorConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            messages: Vec::new(),
            usage: UsageStats::default(),
            validator: Arc::new(AcceptAll),
            max_retries: config.max_structural_retries,
            feedback: config.feedback,
            last_retry_count: 0,
        }
    }

    /// Create a client talking to an `OpenAI`-compatible endpoint
    ///
    /// The key comes from `api_key` or, failing that, the environment variable
    /// named by `provider.api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns `NoKeyDefined` when no key is available, or an internal error
    /// if the HTTP client cannot be built.
    pub fn connect(
        api_key: Option<&str>,
        provider: &ProviderConfig,
        config: &TranslatorConfig,
    ) -> AppResult<Self> {
        let key = resolve_api_key(api_key, &provider.api_key_env)?;
        let transport =
            OpenAiCompatibleProvider::from_provider_config(provider, key, &config.model)?;
        Ok(Self::new(Arc::new(transport), config))
    }

    /// Select the model targeted by subsequent calls
    pub fn configure(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    /// Append a message to the conversation
    pub fn append_message(&mut self, role: MessageRole, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, content));
    }

    /// Install the validator consulted by [`Self::send`]
    pub fn set_validator(&mut self, validator: Arc<dyn ResponseValidator>) {
        self.validator = validator;
    }

    /// Clear the conversation and restore the accept-all validator
    ///
    /// Usage statistics and the configured model are kept.
    pub fn reset_conversation(&mut self) {
        self.messages.clear();
        self.validator = Arc::new(AcceptAll);
    }

    /// Snapshot of cumulative token usage
    #[must_use]
    pub const fn usage(&self) -> UsageStats {
        self.usage
    }

    /// Retry units consumed by the most recent [`Self::send`]
    #[must_use]
    pub const fn last_retry_count(&self) -> u32 {
        self.last_retry_count
    }

    /// Current conversation
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Model identifier sent with each request
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Dispatch the conversation until a response parses and validates
    ///
    /// # Errors
    ///
    /// - `InvalidKey` when the provider reports an authentication failure
    /// - `TooManyRetries` once the structural budget is exhausted
    /// - any other transport error, unchanged
    pub async fn send(&mut self) -> AppResult<(Value, UsageStats)> {
        let mut consumed = 0;
        loop {
            if consumed > self.max_retries {
                self.last_retry_count = consumed;
                warn!(
                    "Giving up after {consumed} rejected responses from {}",
                    self.provider.name()
                );
                return Err(AppError::too_many_retries(self.max_retries));
            }

            let request = ChatRequest::new(self.messages.clone()).with_model(self.model.clone());
            let response = self
                .provider
                .complete(&request)
                .await
                .map_err(classify_transport_error)?;

            // Billed whether or not the content turns out to be usable.
            if let Some(usage) = response.usage {
                self.usage.record(usage);
            }

            let rejection = match parse_completion(&response.content) {
                Ok(parsed) => match self.validator.validate(&parsed).await {
                    Ok(true) => {
                        self.last_retry_count = consumed;
                        debug!("Response accepted after {consumed} retries");
                        return Ok((parsed, self.usage));
                    }
                    Ok(false) => "the response was rejected by the validator".to_owned(),
                    Err(error) => error.to_string(),
                },
                Err(error) => error.to_string(),
            };

            consumed += 1;
            warn!(
                attempt = consumed,
                budget = self.max_retries,
                "Retrying model request: {rejection}"
            );
            self.apply_feedback(response.content, &rejection);
        }
    }

    fn apply_feedback(&mut self, rejected: String, reason: &str) {
        if self.feedback == FeedbackStrategy::AppendToConversation {
            self.messages.push(ChatMessage::assistant(rejected));
            self.messages.push(ChatMessage::user(format!(
                "That response could not be used: {reason}. Respond again with only a corrected JSON object."
            )));
        }
    }
}

/// Promote authentication failures to `InvalidKey`; pass the rest through
fn classify_transport_error(error: AppError) -> AppError {
    if error.code == ErrorCode::InvalidKey {
        return error;
    }
    if error.message.to_lowercase().contains("api key") {
        return AppError::invalid_key(error.message.clone()).with_source(error);
    }
    error
}

/// Parse a completion as a JSON object
///
/// A surrounding Markdown code fence is tolerated.
///
/// # Errors
///
/// Returns `MalformedJson` or `NotAnObject`.
pub fn parse_completion(content: &str) -> Result<Value, ValidationError> {
    let parsed: Value = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| ValidationError::malformed(e.to_string()))?;
    if parsed.is_object() {
        Ok(parsed)
    } else {
        Err(ValidationError::NotAnObject)
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") ending at a newline or the opening brace.
    let inner = match body.find(['\n', '{']) {
        Some(pos) if body[..pos].trim().chars().all(char::is_alphanumeric) => &body[pos..],
        _ => body,
    };
    inner.trim()
}
