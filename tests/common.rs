// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides a scripted model provider, in-memory SQLite fixtures, and quiet logging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `sqlwrite`

use async_trait::async_trait;
use serde_json::json;
use sqlwrite::config::TranslatorConfig;
use sqlwrite::errors::AppError;
use sqlwrite::llm::{ChatRequest, ChatResponse, LlmProvider, TokenUsage};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::VecDeque;
use std::env;
use std::sync::{Arc, Mutex, Once};
use tracing::Level;

static INIT_LOGGER: Once = Once::new();

/// Usage reported by every scripted completion
pub const CALL_USAGE: TokenUsage = TokenUsage {
    prompt_tokens: 10,
    completion_tokens: 5,
    total_tokens: 15,
};

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

// ============================================================================
// Scripted Provider
// ============================================================================

/// Provider replaying a fixed list of outcomes and recording every request
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ChatResponse, AppError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ChatResponse, AppError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Provider answering every call with the given completion texts in order
    pub fn with_completions(completions: &[&str]) -> Arc<Self> {
        Self::new(completions.iter().map(|text| Ok(completion(text))).collect())
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::internal("scripted provider ran out of responses")))
    }
}

/// A successful completion carrying `content`
pub fn completion(content: &str) -> ChatResponse {
    ChatResponse {
        content: content.to_owned(),
        model: "scripted-model".to_owned(),
        usage: Some(CALL_USAGE),
        finish_reason: Some("stop".to_owned()),
    }
}

/// Completion text of a translation answer
pub fn sql_answer(sql: &str) -> String {
    json!({ "SQL": sql, "Indexing": ["Album(ArtistId)"] }).to_string()
}

/// Completion text of a back-translation answer
pub fn translation_answer(text: &str) -> String {
    json!({ "Translation": text }).to_string()
}

// ============================================================================
// Database Fixtures
// ============================================================================

/// Empty in-memory database on a single long-lived connection
pub async fn create_test_pool() -> SqlitePool {
    init_test_logging();
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database")
}

/// Small music catalog: three artists, five albums, one index, one view
pub async fn create_music_pool() -> SqlitePool {
    let pool = create_test_pool().await;
    for statement in [
        "CREATE TABLE Artist (ArtistId INTEGER PRIMARY KEY, Name NVARCHAR(120))",
        "CREATE TABLE Album (AlbumId INTEGER PRIMARY KEY, Title NVARCHAR(160) NOT NULL, \
         ArtistId INTEGER NOT NULL REFERENCES Artist(ArtistId), Price REAL)",
        "CREATE INDEX IFK_AlbumArtistId ON Album (ArtistId)",
        "CREATE VIEW AlbumTitles AS SELECT Title FROM Album",
        "INSERT INTO Artist VALUES (1, 'AC/DC'), (2, 'Accept'), (3, 'Aerosmith')",
        "INSERT INTO Album VALUES \
         (1, 'For Those About To Rock We Salute You', 1, 9.99), \
         (2, 'Let There Be Rock', 1, 8.99), \
         (3, 'Back in Black', 1, NULL), \
         (4, 'Balls to the Wall', 2, 7.5), \
         (5, 'Big Ones', 3, 10.0)",
    ] {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool
}

/// Translator configuration used by orchestration tests
pub fn test_config() -> TranslatorConfig {
    TranslatorConfig {
        model: "scripted-model".to_owned(),
        ..TranslatorConfig::default()
    }
}

/// SQL producing `n` rows without touching any table
pub fn numbers_sql(n: usize) -> String {
    format!("WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < {n}) SELECT x FROM n")
}
