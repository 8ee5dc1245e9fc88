// ABOUTME: Core configuration type definitions for logging, model selection, and validator feedback
// ABOUTME: Contains LogLevel, ModelPreset, and FeedbackStrategy enums used across config modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::constants::models;

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level - only critical errors
    Error,
    /// Warning level - retries and degraded outcomes
    #[default]
    Warn,
    /// Info level - pipeline milestones
    Info,
    /// Debug level - prompts and transport detail
    Debug,
    /// Trace level - very verbose tracing
    Trace,
}

impl LogLevel {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "info" => Self::Info,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Warn,
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Named model variants accepted by `ConversationClient::configure`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelPreset {
    /// GPT-3.5 turbo (default)
    #[default]
    Gpt35,
    /// GPT-4
    Gpt4,
}

impl ModelPreset {
    /// Provider-side model identifier
    #[must_use]
    pub const fn model_id(&self) -> &'static str {
        match self {
            Self::Gpt35 => models::GPT_35,
            Self::Gpt4 => models::GPT_4,
        }
    }

    /// Parse a preset name; unknown names yield `None` so callers can treat
    /// them as raw model identifiers
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gpt35" | "gpt-3.5" | "gpt-3.5-turbo" => Some(Self::Gpt35),
            "gpt4" | "gpt-4" => Some(Self::Gpt4),
            _ => None,
        }
    }
}

impl Display for ModelPreset {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.model_id())
    }
}

/// What the conversation client does with a validator rejection before retrying
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStrategy {
    /// Resend the conversation unchanged (default)
    #[default]
    Silent,
    /// Append the rejected completion and the rejection reason as new turns
    AppendToConversation,
}

impl FeedbackStrategy {
    /// Parse from string with fallback to `Silent`
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "append" | "appendtoconversation" | "feedback" => Self::AppendToConversation,
            _ => Self::Silent,
        }
    }
}

impl Display for FeedbackStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Silent => write!(f, "silent"),
            Self::AppendToConversation => write!(f, "append"),
        }
    }
}
