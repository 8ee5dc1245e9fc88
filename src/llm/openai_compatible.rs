// ABOUTME: OpenAI-compatible chat completion transport used as the translation oracle
// ABOUTME: Posts the conversation to /chat/completions and classifies auth, rate, and connect failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

//! # `OpenAI`-Compatible Provider
//!
//! Non-streaming implementation of [`LlmProvider`] for any endpoint speaking
//! the `OpenAI` chat completions API.
//!
//! ## Configuration
//!
//! - `SQLWRITE_BASE_URL`: Base URL (default: <https://api.openai.com/v1>)
//! - `OPENAI_API_KEY`: API key sent as a bearer token
//!
//! ## Example
//!
//! ```rust,no_run
//! use sqlwrite::config::ProviderConfig;
//! use sqlwrite::llm::{ChatMessage, ChatRequest, LlmProvider, OpenAiCompatibleProvider};
//! use sqlwrite::errors::AppError;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AppError> {
//!     let provider = OpenAiCompatibleProvider::from_provider_config(
//!         &ProviderConfig::from_env(),
//!         "sk-...".to_owned(),
//!         "gpt-3.5-turbo",
//!     )?;
//!     let request = ChatRequest::new(vec![ChatMessage::user("Say hello as JSON")]);
//!     let response = provider.complete(&request).await?;
//!     println!("{}", response.content);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, instrument};

use super::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, TokenUsage};
use crate::config::ProviderConfig;
use crate::constants::network;
use crate::errors::{AppError, ErrorCode};

/// Service label used in external-service error messages
const SERVICE_LABEL: &str = "OpenAI";

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

/// OpenAI-compatible API request structure
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
}

/// Message structure for OpenAI-compatible API
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

/// OpenAI-compatible API response structure
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

/// Usage statistics in response
#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(rename = "prompt_tokens")]
    prompt: u32,
    #[serde(rename = "completion_tokens")]
    completion: u32,
    #[serde(rename = "total_tokens")]
    total: u32,
}

/// Error response structure
#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the `OpenAI`-compatible provider
#[derive(Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL for the API (e.g., <https://api.openai.com/v1>)
    pub base_url: String,
    /// Bearer token
    pub api_key: String,
    /// Model used when a request does not name one
    pub default_model: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Whole-request timeout
    pub request_timeout: Duration,
}

impl OpenAiCompatibleConfig {
    /// Create configuration for the public `OpenAI` endpoint
    #[must_use]
    pub fn openai(api_key: String, model: &str) -> Self {
        Self {
            base_url: network::DEFAULT_BASE_URL.to_owned(),
            api_key,
            default_model: model.to_owned(),
            connect_timeout: Duration::from_secs(network::CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(network::REQUEST_TIMEOUT_SECS),
        }
    }
}

impl fmt::Debug for OpenAiCompatibleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatibleConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("default_model", &self.default_model)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Generic `OpenAI`-compatible LLM provider
#[derive(Debug)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create a provider from transport settings and a resolved key
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_provider_config(
        provider: &ProviderConfig,
        api_key: String,
        model: &str,
    ) -> Result<Self, AppError> {
        debug!(
            "Initializing OpenAI-compatible provider: base_url={}, model={model}",
            provider.base_url
        );
        Self::new(OpenAiCompatibleConfig {
            base_url: provider.base_url.clone(),
            api_key,
            default_model: model.to_owned(),
            connect_timeout: provider.connect_timeout,
            request_timeout: provider.request_timeout,
        })
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    fn add_auth_header(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            "Authorization",
            format!("Bearer {}", self.config.api_key),
        )
    }

    /// Log message details for debugging model interactions
    fn log_messages_debug(messages: &[OpenAiMessage]) {
        for (i, msg) in messages.iter().enumerate() {
            debug!(
                "Message[{i}] role={}, content_len={}",
                msg.role,
                msg.content.len()
            );
        }
        debug!(
            "Sending chat completion request with {} messages",
            messages.len()
        );
    }

    /// Classify a non-success HTTP status
    fn parse_error_response(status: StatusCode, body: &str) -> AppError {
        let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) else {
            return match status.as_u16() {
                401 => AppError::invalid_key("API authentication failed"),
                502..=504 => AppError::new(
                    ErrorCode::ExternalServiceUnavailable,
                    format!("Model endpoint is not responding ({status})"),
                ),
                _ => AppError::external_service(
                    SERVICE_LABEL,
                    format!(
                        "API error ({status}): {}",
                        body.chars().take(200).collect::<String>()
                    ),
                ),
            };
        };

        let detail = error_response.error;
        if status == StatusCode::UNAUTHORIZED || mentions_api_key(&detail.message) {
            return AppError::invalid_key(format!(
                "API authentication failed: {}",
                detail.message
            ));
        }

        match status.as_u16() {
            429 => AppError::new(
                ErrorCode::ExternalRateLimited,
                extract_rate_limit_message(&detail.message),
            ),
            400 => AppError::invalid_input(format!("API validation error: {}", detail.message)),
            503 => AppError::new(
                ErrorCode::ExternalServiceUnavailable,
                format!("Service unavailable: {}", detail.message),
            ),
            _ => AppError::external_service(
                SERVICE_LABEL,
                format!(
                    "{} - {}",
                    detail.error_type.as_deref().unwrap_or("unknown"),
                    detail.message
                ),
            ),
        }
    }
}

/// Whether a provider error message describes a credential problem
fn mentions_api_key(message: &str) -> bool {
    message.to_lowercase().contains("api key")
}

/// Extract a user-friendly rate limit message
///
/// `OpenAI` rate limit errors may include "try again in Xs".
fn extract_rate_limit_message(message: &str) -> String {
    const MARKER: &str = "try again in ";
    let lowered = message.to_lowercase();
    if let Some(retry_pos) = lowered.find(MARKER) {
        let after_prefix = &lowered[retry_pos + MARKER.len()..];
        let number: String = after_prefix
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if let Ok(seconds) = number.parse::<f64>() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let seconds_int = seconds.ceil() as u64;
            return format!("Model rate limit reached. Please try again in {seconds_int} seconds.");
        }
    }
    "Model rate limit reached. Please wait a moment and try again.".to_owned()
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.config.default_model)))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);

        let messages: Vec<OpenAiMessage> =
            request.messages.iter().map(OpenAiMessage::from).collect();
        Self::log_messages_debug(&messages);

        let openai_request = OpenAiRequest {
            model: model.to_owned(),
            messages,
        };

        let http_request = self
            .client
            .post(self.api_url("chat/completions"))
            .header("Content-Type", "application/json")
            .json(&openai_request);

        let response = self
            .add_auth_header(http_request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to model endpoint: {e}");
                if e.is_connect() || e.is_timeout() {
                    AppError::new(
                        ErrorCode::ExternalServiceUnavailable,
                        format!("Cannot reach {}: {e}", self.config.base_url),
                    )
                } else {
                    AppError::external_service(SERVICE_LABEL, format!("Failed to connect: {e}"))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read API response: {e}");
            AppError::external_service(SERVICE_LABEL, format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let openai_response: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            error!(
                "Failed to parse API response: {e} - body: {}",
                body.chars().take(500).collect::<String>()
            );
            AppError::external_service(SERVICE_LABEL, format!("Failed to parse response: {e}"))
        })?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service(SERVICE_LABEL, "API returned no choices"))?;

        let content = choice.message.content.unwrap_or_default();
        debug!(
            "Received response: {} chars, finish_reason: {:?}",
            content.len(),
            choice.finish_reason
        );

        Ok(ChatResponse {
            content,
            model: openai_response.model,
            usage: openai_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt,
                completion_tokens: u.completion,
                total_tokens: u.total,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_invalid_key() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        let error = OpenAiCompatibleProvider::parse_error_response(StatusCode::UNAUTHORIZED, body);
        assert_eq!(error.code, ErrorCode::InvalidKey);
    }

    #[test]
    fn test_api_key_message_maps_to_invalid_key() {
        let body = r#"{"error":{"message":"You didn't provide an API key.","type":null}}"#;
        let error = OpenAiCompatibleProvider::parse_error_response(StatusCode::BAD_REQUEST, body);
        assert_eq!(error.code, ErrorCode::InvalidKey);
    }

    #[test]
    fn test_rate_limit_message() {
        let body = r#"{"error":{"message":"Rate limit reached. Please try again in 1.2s.","type":"requests"}}"#;
        let error =
            OpenAiCompatibleProvider::parse_error_response(StatusCode::TOO_MANY_REQUESTS, body);
        assert_eq!(error.code, ErrorCode::ExternalRateLimited);
        assert!(error.message.contains("2 seconds"));
    }

    #[test]
    fn test_non_json_gateway_error() {
        let error =
            OpenAiCompatibleProvider::parse_error_response(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(error.code, ErrorCode::ExternalServiceUnavailable);
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = OpenAiCompatibleConfig::openai("sk-secret".to_owned(), "gpt-4");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn test_api_url_trims_slash() {
        let mut config = OpenAiCompatibleConfig::openai("k".to_owned(), "gpt-4");
        config.base_url = "http://localhost:8080/v1/".to_owned();
        let provider = OpenAiCompatibleProvider::new(config).unwrap();
        assert_eq!(
            provider.api_url("chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }
}
