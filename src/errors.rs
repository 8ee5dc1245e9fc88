// ABOUTME: Unified error handling for the translation pipeline with stable error codes
// ABOUTME: Separates fatal AppError conditions from recoverable validator rejections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

//! # Unified Error Handling System
//!
//! Two channels are kept apart:
//!
//! - [`AppError`] carries conditions that end an operation (missing or rejected
//!   credentials, exhausted retry budget, empty schema, execution failures at
//!   render time, transport failures).
//! - [`ValidationError`] carries expected rejections of a model response. A
//!   validator returns it, the conversation client absorbs it as one retry
//!   unit, and it never escapes `send()`.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Credentials (1000-1999)
    /// No API key was provided explicitly or through the environment
    #[serde(rename = "NO_KEY_DEFINED")]
    NoKeyDefined = 1000,
    /// The provider rejected the API key
    #[serde(rename = "INVALID_KEY")]
    InvalidKey = 1001,

    // Translation (2000-2999)
    /// The structural/validity retry budget of one `send()` was exhausted
    #[serde(rename = "TOO_MANY_RETRIES")]
    TooManyRetries = 2000,
    /// The database holds no tables or views to translate against
    #[serde(rename = "NO_SCHEMA_AVAILABLE")]
    NoSchemaAvailable = 2001,
    /// The final SQL failed to execute during rendering
    #[serde(rename = "EXECUTION_ERROR")]
    ExecutionError = 2002,
    /// The SQL to natural-language round trip produced no usable translation
    #[serde(rename = "BACK_TRANSLATION_FAILED")]
    BackTranslationFailed = 2003,

    // Validation (3000-3999)
    /// Caller supplied an unusable argument
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,

    // External Services (5000-5999)
    /// The model provider returned an error
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 5000,
    /// The model provider could not be reached
    #[serde(rename = "EXTERNAL_SERVICE_UNAVAILABLE")]
    ExternalServiceUnavailable = 5001,
    /// The model provider rejected the request for rate reasons
    #[serde(rename = "EXTERNAL_RATE_LIMITED")]
    ExternalRateLimited = 5003,

    // Configuration (6000-6999)
    /// Configuration value has an invalid value
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid = 6002,

    // Internal Errors (9000-9999)
    /// Unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    /// Database statement failed outside of rendering
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError = 9001,
    /// JSON encoding or decoding failed
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9003,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::NoKeyDefined => "No API key is defined",
            Self::InvalidKey => "The API key was rejected by the model provider",
            Self::TooManyRetries => "Maximum number of retries exceeded",
            Self::NoSchemaAvailable => "No tables or views are available",
            Self::ExecutionError => "SQL execution failed",
            Self::BackTranslationFailed => "Back-translation to natural language failed",
            Self::InvalidInput => "The provided input is invalid",
            Self::ExternalServiceError => "The model provider encountered an error",
            Self::ExternalServiceUnavailable => "The model provider is currently unavailable",
            Self::ExternalRateLimited => "The model provider rate limit was exceeded",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::InternalError => "An internal error occurred",
            Self::DatabaseError => "Database operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }

    /// Whether the propagation policy lets this code terminate a whole operation
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NoKeyDefined | Self::InvalidKey | Self::TooManyRetries | Self::NoSchemaAvailable
        )
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Whether this error is one of the operation-terminating kinds
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        self.code.is_fatal()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Convenience functions for creating common errors
impl AppError {
    /// No credential at client construction
    #[must_use]
    pub fn no_key_defined(key_name: &str) -> Self {
        Self::new(
            ErrorCode::NoKeyDefined,
            format!(
                "There was no key defined in the constructor or in the environment variable {key_name}."
            ),
        )
    }

    /// Provider reported an authentication failure
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidKey, message)
    }

    /// Structural/validity budget exhausted
    #[must_use]
    pub fn too_many_retries(max_retries: u32) -> Self {
        Self::new(
            ErrorCode::TooManyRetries,
            format!("Maximum number of retries exceeded ({max_retries})."),
        )
    }

    /// Schema has no tables or views
    #[must_use]
    pub fn no_schema_available() -> Self {
        Self::new(
            ErrorCode::NoSchemaAvailable,
            "you need to load a table first.",
        )
    }

    /// Final execution failed
    #[must_use]
    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExecutionError, message)
    }

    /// Back-translation failed
    #[must_use]
    pub fn back_translation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BackTranslationFailed, message)
    }

    /// Invalid input
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Database error
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// External service error
    #[must_use]
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", service.into(), message.into()),
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::database(error.to_string()).with_source(error)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorCode::SerializationError, error.to_string()).with_source(error)
    }
}

/// Recoverable rejection of a model response.
///
/// Returned by validators; the conversation client treats every variant as
/// one consumed retry unit, the same as a validator returning `false`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Completion text could not be parsed as JSON
    #[error("response is not valid JSON: {message}")]
    MalformedJson {
        /// Parser diagnostic
        message: String,
    },
    /// Parsed completion was not a JSON object
    #[error("response is not a JSON object")]
    NotAnObject,
    /// A required field is absent
    #[error("response is missing required field '{field}'")]
    MissingField {
        /// Name of the absent field
        field: String,
    },
    /// A field has the wrong JSON type
    #[error("field '{field}' has the wrong type: expected {expected}")]
    WrongType {
        /// Name of the offending field
        field: String,
        /// Description of the expected type
        expected: String,
    },
    /// The candidate SQL failed the dry-run probe
    #[error("SQL probe failed: {message}")]
    ProbeFailed {
        /// Error reported by the database
        message: String,
    },
}

impl ValidationError {
    /// Create a "malformed JSON" rejection
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedJson {
            message: message.into(),
        }
    }

    /// Create a "missing field" rejection
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create a "wrong type" rejection
    #[must_use]
    pub fn wrong_type(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::WrongType {
            field: field.into(),
            expected: expected.into(),
        }
    }

    /// Create a "probe failed" rejection
    #[must_use]
    pub fn probe_failed(message: impl Into<String>) -> Self {
        Self::ProbeFailed {
            message: message.into(),
        }
    }
}
