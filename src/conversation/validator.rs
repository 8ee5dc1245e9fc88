// ABOUTME: Pluggable response validator contract consulted by the conversation client
// ABOUTME: Provides the accept-all default and a closure adapter for synchronous predicates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ValidationError;

/// Semantic check applied to every parsed model response
///
/// `Ok(true)` accepts the response. `Ok(false)` and `Err(_)` both reject it and
/// cost the caller one retry unit; the error only adds a diagnostic. A
/// validator may have side effects such as a dry-run against the database.
#[async_trait]
pub trait ResponseValidator: Send + Sync {
    /// Judge one parsed response
    async fn validate(&self, response: &Value) -> Result<bool, ValidationError>;
}

/// Default validator that accepts every parsed object
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

#[async_trait]
impl ResponseValidator for AcceptAll {
    async fn validate(&self, _response: &Value) -> Result<bool, ValidationError> {
        Ok(true)
    }
}

/// Adapter turning a synchronous predicate into a [`ResponseValidator`]
pub struct FnValidator<F> {
    predicate: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&Value) -> Result<bool, ValidationError> + Send + Sync,
{
    /// Wrap a predicate
    pub const fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

#[async_trait]
impl<F> ResponseValidator for FnValidator<F>
where
    F: Fn(&Value) -> Result<bool, ValidationError> + Send + Sync,
{
    async fn validate(&self, response: &Value) -> Result<bool, ValidationError> {
        (self.predicate)(response)
    }
}

/// Require `field` to be present and hold a string
///
/// # Errors
///
/// Returns `MissingField` or `WrongType` naming the field.
pub fn require_string_field<'a>(
    response: &'a Value,
    field: &str,
) -> Result<&'a str, ValidationError> {
    match response.get(field) {
        None | Some(Value::Null) => Err(ValidationError::missing_field(field)),
        Some(Value::String(text)) => Ok(text),
        Some(_) => Err(ValidationError::wrong_type(field, "string")),
    }
}
