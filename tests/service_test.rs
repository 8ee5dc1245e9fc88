// ABOUTME: End-to-end tests for the ask and sqlwrite entry points with a scripted model
// ABOUTME: Checks sink output, back-translation reporting, usage totals, and fatal errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{
    completion, create_music_pool, create_test_pool, sql_answer, test_config,
    translation_answer, ScriptedProvider, CALL_USAGE,
};
use sqlwrite::config::{ProviderConfig, TranslationFeatures, TranslatorConfig};
use sqlwrite::database::SqliteIntrospector;
use sqlwrite::errors::{AppError, ErrorCode};
use sqlwrite::service::SqlWrite;
use sqlx::SqlitePool;
use std::sync::Arc;

const ACDC_SQL: &str = "SELECT Title FROM Album WHERE ArtistId = 1 ORDER BY AlbumId";

fn service(pool: &SqlitePool, provider: &Arc<ScriptedProvider>, config: TranslatorConfig) -> SqlWrite {
    SqlWrite::new(
        Arc::new(SqliteIntrospector::new(pool.clone())),
        provider.clone(),
        config,
    )
}

fn output(sink: Vec<u8>) -> String {
    String::from_utf8(sink).unwrap()
}

#[tokio::test]
async fn test_ask_renders_rows_then_translation() {
    let pool = create_music_pool().await;
    let provider = ScriptedProvider::with_completions(&[&sql_answer(ACDC_SQL)]);
    let mut sink = Vec::new();

    let report = service(&pool, &provider, test_config())
        .ask("Which albums did AC/DC release?", &mut sink)
        .await
        .unwrap();

    assert_eq!(
        output(sink),
        format!(
            "For Those About To Rock We Salute You\n\
             Let There Be Rock\n\
             Back in Black\n\
             (SQLwrite translation to SQL: {ACDC_SQL})\n\
             Indexing suggestions:\n  Album(ArtistId)\n"
        )
    );
    assert_eq!(report.rows_rendered, Some(3));
    assert_eq!(report.back_translation, None);
    assert_eq!(report.usage.total_tokens, u64::from(CALL_USAGE.total_tokens));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_ask_without_index_suggestions() {
    let pool = create_music_pool().await;
    let provider = ScriptedProvider::with_completions(&[&sql_answer(ACDC_SQL)]);
    let config = test_config().with_feature(TranslationFeatures::INDEX_SUGGESTIONS, false);
    let mut sink = Vec::new();

    service(&pool, &provider, config)
        .ask("Which albums did AC/DC release?", &mut sink)
        .await
        .unwrap();

    let text = output(sink);
    assert!(!text.contains("Indexing suggestions"));
    assert!(text.ends_with(&format!("(SQLwrite translation to SQL: {ACDC_SQL})\n")));
}

#[tokio::test]
async fn test_ask_with_back_translation_enabled() {
    let pool = create_music_pool().await;
    let provider = ScriptedProvider::with_completions(&[
        &sql_answer(ACDC_SQL),
        &translation_answer("List the albums by AC/DC."),
    ]);
    let config = test_config().with_feature(TranslationFeatures::BACK_TRANSLATION, true);
    let mut sink = Vec::new();

    let report = service(&pool, &provider, config)
        .ask("Which albums did AC/DC release?", &mut sink)
        .await
        .unwrap();

    assert!(output(sink).ends_with("(SQLwrite back-translation: List the albums by AC/DC.)\n"));
    assert_eq!(
        report.back_translation.as_deref(),
        Some("List the albums by AC/DC.")
    );
    assert_eq!(
        report.usage.total_tokens,
        2 * u64::from(CALL_USAGE.total_tokens)
    );
}

#[tokio::test]
async fn test_sqlwrite_does_not_execute_and_back_translates() {
    let pool = create_music_pool().await;
    let delete = "DELETE FROM Album WHERE ArtistId = 2 RETURNING Title";
    let provider = ScriptedProvider::with_completions(&[
        &sql_answer(delete),
        &translation_answer("Remove the albums by Accept."),
    ]);
    let mut sink = Vec::new();

    let report = service(&pool, &provider, test_config())
        .sqlwrite("Get rid of Accept", &mut sink)
        .await
        .unwrap();

    assert_eq!(
        output(sink),
        format!(
            "(SQLwrite translation to SQL: {delete})\n\
             Indexing suggestions:\n  Album(ArtistId)\n\
             (SQLwrite back-translation: Remove the albums by Accept.)\n"
        )
    );
    assert_eq!(report.rows_rendered, None);
    assert_eq!(report.outcome.row_count, Some(1));

    let (remaining,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM Album")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 5);

    // The back-translation request restates the chosen SQL.
    let requests = provider.requests();
    assert!(requests[1]
        .messages
        .iter()
        .any(|m| m.content.contains(&format!("'{delete}'"))));
}

#[tokio::test]
async fn test_back_translation_failure_keeps_earlier_output() {
    let pool = create_music_pool().await;
    let config = TranslatorConfig {
        max_structural_retries: 1,
        ..test_config()
    };
    let provider = ScriptedProvider::with_completions(&[
        &sql_answer(ACDC_SQL),
        r#"{"Answer": "albums"}"#,
        r#"{"Translation": 3}"#,
    ]);
    let mut sink = Vec::new();

    let report = service(&pool, &provider, config)
        .sqlwrite("Which albums did AC/DC release?", &mut sink)
        .await
        .unwrap();

    let text = output(sink);
    assert!(text.starts_with(&format!("(SQLwrite translation to SQL: {ACDC_SQL})\n")));
    assert!(text.contains("(SQLwrite back-translation unavailable: "));
    assert_eq!(report.back_translation, None);
    assert_eq!(report.outcome.sql, ACDC_SQL);
    assert_eq!(
        report.usage.total_tokens,
        3 * u64::from(CALL_USAGE.total_tokens)
    );
}

#[tokio::test]
async fn test_ask_on_empty_database_fails_without_model_call() {
    let pool = create_test_pool().await;
    let provider = ScriptedProvider::with_completions(&[&sql_answer("SELECT 1")]);
    let mut sink = Vec::new();

    let error = service(&pool, &provider, test_config())
        .ask("anything", &mut sink)
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::NoSchemaAvailable);
    assert!(error.is_fatal());
    assert_eq!(provider.call_count(), 0);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_invalid_key_surfaces_from_ask() {
    let pool = create_music_pool().await;
    let provider = ScriptedProvider::new(vec![
        Err(AppError::invalid_key("Invalid API key for OpenAI")),
        Ok(completion(&sql_answer(ACDC_SQL))),
    ]);
    let mut sink = Vec::new();

    let error = service(&pool, &provider, test_config())
        .ask("Which albums did AC/DC release?", &mut sink)
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::InvalidKey);
    assert_eq!(provider.call_count(), 1);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_empty_question_rejected() {
    let pool = create_music_pool().await;
    let provider = ScriptedProvider::with_completions(&[]);
    let mut sink = Vec::new();

    let error = service(&pool, &provider, test_config())
        .sqlwrite("   ", &mut sink)
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::InvalidInput);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_connect_requires_key() {
    let pool = create_music_pool().await;
    let provider = ProviderConfig {
        api_key_env: "SQLWRITE_SERVICE_TEST_KEY_NEVER_SET".to_owned(),
        ..ProviderConfig::default()
    };

    let Err(error) = SqlWrite::connect(pool.clone(), None, &provider, test_config()) else {
        panic!("connect must fail without a key");
    };
    assert_eq!(error.code, ErrorCode::NoKeyDefined);

    let invalid = TranslatorConfig {
        large_result_threshold: 0,
        ..test_config()
    };
    let Err(error) = SqlWrite::connect(pool, Some("sk-test"), &provider, invalid) else {
        panic!("connect must reject an invalid configuration");
    };
    assert_eq!(error.code, ErrorCode::ConfigInvalid);
}
