// ABOUTME: Invocation surface exposing the ask and sqlwrite entry points
// ABOUTME: Builds one conversation client per request and writes results to a caller-supplied sink
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

//! # `SQLwrite` Service
//!
//! Two entry points, each taking one natural-language string:
//!
//! - [`SqlWrite::ask`] translates, executes, and prints rows
//! - [`SqlWrite::sqlwrite`] translates and prints the SQL with its restatement
//!
//! Back-translation failures are logged and written to the sink; they never
//! undo output already delivered.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::io::Write;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{resolve_api_key, ProviderConfig, TranslationFeatures, TranslatorConfig};
use crate::conversation::{ConversationClient, UsageStats};
use crate::database::{DatabaseIntrospector, SqliteIntrospector};
use crate::errors::{AppError, AppResult};
use crate::llm::{LlmProvider, OpenAiCompatibleProvider};
use crate::render;
use crate::translation::{Orchestrator, TranslationOutcome};

/// What one invocation produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Translation result
    pub outcome: TranslationOutcome,
    /// Rows written by the final render, when rows were rendered
    pub rows_rendered: Option<usize>,
    /// Restatement of the chosen SQL, when one was obtained
    pub back_translation: Option<String>,
    /// Token usage of the whole invocation
    pub usage: UsageStats,
}

/// Natural-language query service over one database
pub struct SqlWrite {
    db: Arc<dyn DatabaseIntrospector>,
    provider: Arc<dyn LlmProvider>,
    orchestrator: Orchestrator,
    config: TranslatorConfig,
}

impl SqlWrite {
    /// Create a service from its collaborators
    #[must_use]
    pub fn new(
        db: Arc<dyn DatabaseIntrospector>,
        provider: Arc<dyn LlmProvider>,
        config: TranslatorConfig,
    ) -> Self {
        let orchestrator = Orchestrator::new(Arc::clone(&db), config.clone());
        Self {
            db,
            provider,
            orchestrator,
            config,
        }
    }

    /// Create a service over a `SQLite` pool and an `OpenAI`-compatible endpoint
    ///
    /// # Errors
    ///
    /// Returns `NoKeyDefined` when no API key is available, or a configuration
    /// error when `config` is invalid.
    pub fn connect(
        pool: SqlitePool,
        api_key: Option<&str>,
        provider_config: &ProviderConfig,
        config: TranslatorConfig,
    ) -> AppResult<Self> {
        config.validate()?;
        let key = resolve_api_key(api_key, &provider_config.api_key_env)?;
        let provider =
            OpenAiCompatibleProvider::from_provider_config(provider_config, key, &config.model)?;
        Ok(Self::new(
            Arc::new(SqliteIntrospector::new(pool)),
            Arc::new(provider),
            config,
        ))
    }

    fn new_client(&self) -> ConversationClient {
        ConversationClient::new(Arc::clone(&self.provider), &self.config)
    }

    fn check_question(question: &str) -> AppResult<()> {
        if question.trim().is_empty() {
            return Err(AppError::invalid_input("The question must not be empty."));
        }
        Ok(())
    }

    /// Translate, execute, and print the rows of `question`
    ///
    /// # Errors
    ///
    /// Returns the fatal translation errors (`NoSchemaAvailable`, `InvalidKey`,
    /// `TooManyRetries`), `ExecutionError` if the final render fails, and
    /// `InvalidInput` for an empty question.
    pub async fn ask<W: Write>(&self, question: &str, sink: &mut W) -> AppResult<SessionReport> {
        Self::check_question(question)?;
        let request_id = Uuid::new_v4();
        let span = info_span!("ask", %request_id);

        async {
            let mut client = self.new_client();
            let outcome = self.orchestrator.translate(&mut client, question).await?;
            let rows = render::render_rows(self.db.as_ref(), &outcome.sql, sink).await?;
            render::write_translation(sink, &outcome.sql)?;
            if self.index_suggestions_enabled() {
                render::write_index_suggestions(sink, &outcome.indexing)?;
            }

            let back_translation = if self
                .config
                .features
                .contains(TranslationFeatures::BACK_TRANSLATION)
            {
                self.report_back_translation(&mut client, &outcome.sql, sink)
                    .await?
            } else {
                None
            };

            info!(rows, iterations = outcome.iterations, "ask completed");
            Ok::<_, AppError>(SessionReport {
                usage: client.usage(),
                outcome,
                rows_rendered: Some(rows),
                back_translation,
            })
        }
        .instrument(span)
        .await
    }

    /// Translate `question` and print the SQL, index suggestions, and restatement
    ///
    /// The final SQL is not executed.
    ///
    /// # Errors
    ///
    /// Returns the fatal translation errors (`NoSchemaAvailable`, `InvalidKey`,
    /// `TooManyRetries`) and `InvalidInput` for an empty question.
    pub async fn sqlwrite<W: Write>(
        &self,
        question: &str,
        sink: &mut W,
    ) -> AppResult<SessionReport> {
        Self::check_question(question)?;
        let request_id = Uuid::new_v4();
        let span = info_span!("sqlwrite", %request_id);

        async {
            let mut client = self.new_client();
            let outcome = self.orchestrator.translate(&mut client, question).await?;
            render::write_translation(sink, &outcome.sql)?;
            if self.index_suggestions_enabled() {
                render::write_index_suggestions(sink, &outcome.indexing)?;
            }
            let back_translation = self
                .report_back_translation(&mut client, &outcome.sql, sink)
                .await?;

            info!(iterations = outcome.iterations, "sqlwrite completed");
            Ok::<_, AppError>(SessionReport {
                usage: client.usage(),
                outcome,
                rows_rendered: None,
                back_translation,
            })
        }
        .instrument(span)
        .await
    }

    fn index_suggestions_enabled(&self) -> bool {
        self.config
            .features
            .contains(TranslationFeatures::INDEX_SUGGESTIONS)
    }

    /// Run back-translation and write its result; failures are reported, not raised
    async fn report_back_translation<W: Write>(
        &self,
        client: &mut ConversationClient,
        sql: &str,
        sink: &mut W,
    ) -> AppResult<Option<String>> {
        match self.orchestrator.back_translate(client, sql).await {
            Ok(text) => {
                render::write_back_translation(sink, &text)?;
                Ok(Some(text))
            }
            Err(error) => {
                warn!("Back-translation failed: {error}");
                render::write_back_translation_failure(sink, &error)?;
                Ok(None)
            }
        }
    }
}
