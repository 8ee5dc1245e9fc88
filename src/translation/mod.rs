// ABOUTME: Translation orchestrator driving prompt, validation, shape checks, and question rewrites
// ABOUTME: Layers the shape-driven outer loop over the conversation client's structural retries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

//! # Translation Orchestrator
//!
//! One call to [`Orchestrator::translate`] runs the state machine
//! `BuildPrompt -> Ask -> Validate -> CheckShape -> {Accept | Mutate | Abort}`:
//!
//! 1. The prompt is rebuilt from the current question and a schema snapshot.
//! 2. The conversation client asks the model with a [`SqlProbeValidator`], so
//!    only SQL that executes comes back.
//! 3. The accepted SQL is run again to count rows. Zero rows appends a relax
//!    hint to the question, a count at or above the threshold appends a
//!    constrain hint. Each hint is applied at most once per call.
//! 4. When the shape budget runs out the last candidate is returned anyway.

mod response;

pub use response::{
    unescape_sql, ModelResponse, SqlProbeValidator, TranslationFieldValidator, INDEXING_FIELD,
    SQL_FIELD, TRANSLATION_FIELD,
};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::{TranslationFeatures, TranslatorConfig};
use crate::conversation::{ConversationClient, UsageStats};
use crate::database::DatabaseIntrospector;
use crate::errors::{AppError, AppResult};
use crate::llm::prompts::{CONSTRAIN_HINT, RELAX_HINT, SQL_ASSISTANT_SYSTEM_PROMPT};
use crate::llm::MessageRole;
use crate::prompt::{build_back_translation_prompt, build_prompt, SchemaDescriptor};

/// Row-count classification of an executed candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultShape {
    /// No rows
    Empty,
    /// Within the open interval `(0, threshold)`
    Acceptable(usize),
    /// At or above the threshold
    TooLarge(usize),
}

impl ResultShape {
    /// Classify `rows` against `threshold`
    #[must_use]
    pub const fn classify(rows: usize, threshold: usize) -> Self {
        if rows == 0 {
            Self::Empty
        } else if rows >= threshold {
            Self::TooLarge(rows)
        } else {
            Self::Acceptable(rows)
        }
    }
}

/// Result of one orchestrated translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationOutcome {
    /// Question text after any hints were appended
    pub question: String,
    /// Chosen SQL
    pub sql: String,
    /// Index suggestions returned with the chosen SQL
    pub indexing: Vec<String>,
    /// Outer iterations performed
    pub iterations: u32,
    /// Whether the chosen SQL passed the shape check
    pub accepted: bool,
    /// Row count of the chosen SQL, when it was measured
    pub row_count: Option<usize>,
    /// Client usage after the translation
    pub usage: UsageStats,
}

/// Drives translation requests against one database
pub struct Orchestrator {
    db: Arc<dyn DatabaseIntrospector>,
    config: TranslatorConfig,
}

impl Orchestrator {
    /// Create an orchestrator over a shared database capability
    #[must_use]
    pub fn new(db: Arc<dyn DatabaseIntrospector>, config: TranslatorConfig) -> Self {
        Self { db, config }
    }

    /// Number of outer iterations allowed by the configuration
    fn iteration_budget(&self) -> u32 {
        if self
            .config
            .features
            .contains(TranslationFeatures::SHAPE_RETRY)
        {
            self.config.max_shape_retries.max(1)
        } else {
            1
        }
    }

    /// Translate `question` into SQL
    ///
    /// # Errors
    ///
    /// - `NoSchemaAvailable` before any model call when the database is empty
    /// - `InvalidKey` or `TooManyRetries` from the conversation client
    /// - database errors raised while collecting the schema snapshot
    #[instrument(skip(self, client, question), fields(model = %client.model()))]
    pub async fn translate(
        &self,
        client: &mut ConversationClient,
        question: &str,
    ) -> AppResult<TranslationOutcome> {
        let schema = SchemaDescriptor::collect(self.db.as_ref(), &self.config).await?;
        if schema.is_empty() {
            return Err(AppError::no_schema_available());
        }

        let budget = self.iteration_budget();
        let shape_retry = self
            .config
            .features
            .contains(TranslationFeatures::SHAPE_RETRY);
        let mut question = question.to_owned();
        let mut relaxed = false;
        let mut constrained = false;
        let mut last: Option<(ModelResponse, Option<usize>)> = None;
        let mut iterations = 0;
        let mut accepted = false;

        while iterations < budget {
            iterations += 1;
            let prompt = build_prompt(&schema, &question)?;
            debug!(iteration = iterations, "Prompt:\n{prompt}");

            client.reset_conversation();
            client.append_message(MessageRole::System, SQL_ASSISTANT_SYSTEM_PROMPT);
            client.append_message(MessageRole::User, prompt);
            client.set_validator(Arc::new(SqlProbeValidator::new(Arc::clone(&self.db))));

            let (value, _) = client.send().await?;
            let candidate = ModelResponse::from_value(&value).map_err(|e| {
                AppError::internal(format!("validated response lost its shape: {e}"))
            })?;
            info!(iteration = iterations, sql = %candidate.sql, "Model produced candidate SQL");

            if !shape_retry {
                last = Some((candidate, None));
                accepted = true;
                break;
            }

            let rows = match self.db.count_rows(&candidate.sql).await {
                Ok(rows) => rows,
                Err(error) => {
                    warn!("Counting rows failed, spending one shape retry: {error}");
                    last = Some((candidate, None));
                    continue;
                }
            };
            last = Some((candidate, Some(rows)));

            match ResultShape::classify(rows, self.config.large_result_threshold) {
                ResultShape::Acceptable(rows) => {
                    info!(rows, iterations, "Result shape accepted");
                    accepted = true;
                    break;
                }
                ResultShape::Empty => {
                    warn!("Query returned no rows");
                    if !relaxed {
                        question.push_str(RELAX_HINT);
                        relaxed = true;
                    }
                }
                ResultShape::TooLarge(rows) => {
                    warn!(rows, "Query returned too many rows");
                    if !constrained {
                        question.push_str(CONSTRAIN_HINT);
                        constrained = true;
                    }
                }
            }
        }

        let (candidate, row_count) =
            last.ok_or_else(|| AppError::internal("translation loop produced no candidate"))?;
        if !accepted {
            warn!(iterations, "Shape budget exhausted, using the last candidate");
        }

        Ok(TranslationOutcome {
            question,
            sql: candidate.sql,
            indexing: candidate.indexing,
            iterations,
            accepted,
            row_count,
            usage: client.usage(),
        })
    }

    /// Ask the model to restate `sql` in natural language
    ///
    /// The client conversation is reset first; usage keeps accumulating.
    ///
    /// # Errors
    ///
    /// Every failure is reported as `BackTranslationFailed`.
    #[instrument(skip(self, client, sql))]
    pub async fn back_translate(
        &self,
        client: &mut ConversationClient,
        sql: &str,
    ) -> AppResult<String> {
        let wrap =
            |error: AppError| AppError::back_translation(error.message.clone()).with_source(error);

        let schema = SchemaDescriptor::collect(self.db.as_ref(), &self.config)
            .await
            .map_err(wrap)?;
        let prompt = build_back_translation_prompt(&schema, sql).map_err(wrap)?;

        client.reset_conversation();
        client.append_message(MessageRole::System, SQL_ASSISTANT_SYSTEM_PROMPT);
        client.append_message(MessageRole::User, prompt);
        client.set_validator(Arc::new(TranslationFieldValidator));

        let (value, _) = client.send().await.map_err(wrap)?;
        value
            .get(TRANSLATION_FIELD)
            .and_then(|text| text.as_str())
            .map(ToOwned::to_owned)
            .ok_or_else(|| AppError::back_translation("response has no Translation field"))
    }
}
