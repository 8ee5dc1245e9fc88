// ABOUTME: Typed model responses and the validators that gate them
// ABOUTME: Extracts SQL and index suggestions, unescapes SQL text, and dry-runs it against the database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::conversation::{require_string_field, ResponseValidator};
use crate::database::DatabaseIntrospector;
use crate::errors::ValidationError;

/// Field holding the candidate query
pub const SQL_FIELD: &str = "SQL";
/// Field holding index suggestions
pub const INDEXING_FIELD: &str = "Indexing";
/// Field holding a back-translation
pub const TRANSLATION_FIELD: &str = "Translation";

/// A model answer to a translation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Candidate SQL with escape sequences removed
    pub sql: String,
    /// Human-readable index suggestions
    pub indexing: Vec<String>,
}

impl ModelResponse {
    /// Extract and type-check the fields of a parsed response
    ///
    /// # Errors
    ///
    /// Returns a rejection when `SQL` is absent or not a string, or when
    /// `Indexing` is present but not an array of strings.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let sql = unescape_sql(require_string_field(value, SQL_FIELD)?);
        let indexing = match value.get(INDEXING_FIELD) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => entries
                .iter()
                .map(|entry| {
                    entry.as_str().map(ToOwned::to_owned).ok_or_else(|| {
                        ValidationError::wrong_type(INDEXING_FIELD, "array of strings")
                    })
                })
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(ValidationError::wrong_type(
                    INDEXING_FIELD,
                    "array of strings",
                ))
            }
        };
        Ok(Self { sql, indexing })
    }
}

/// Replace literal `\n` sequences with a space and unescape `\"`
#[must_use]
pub fn unescape_sql(raw: &str) -> String {
    raw.replace("\\n", " ").replace("\\\"", "\"")
}

/// Accepts a response only when its SQL executes against the database
pub struct SqlProbeValidator {
    db: Arc<dyn DatabaseIntrospector>,
}

impl SqlProbeValidator {
    /// Create a validator probing `db`
    #[must_use]
    pub fn new(db: Arc<dyn DatabaseIntrospector>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResponseValidator for SqlProbeValidator {
    async fn validate(&self, response: &Value) -> Result<bool, ValidationError> {
        let candidate = ModelResponse::from_value(response)?;
        if candidate.sql.trim().is_empty() {
            return Ok(false);
        }
        self.db
            .execute_discard(&candidate.sql)
            .await
            .map_err(|e| ValidationError::probe_failed(e.message))?;
        debug!("Dry-run probe accepted candidate SQL");
        Ok(true)
    }
}

/// Accepts a response carrying a string `Translation` field
#[derive(Debug, Clone, Copy, Default)]
pub struct TranslationFieldValidator;

#[async_trait]
impl ResponseValidator for TranslationFieldValidator {
    async fn validate(&self, response: &Value) -> Result<bool, ValidationError> {
        require_string_field(response, TRANSLATION_FIELD).map(|_| true)
    }
}
