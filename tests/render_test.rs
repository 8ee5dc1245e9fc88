// ABOUTME: Integration tests for row rendering and the one-line report writers
// ABOUTME: Validates delimiter output, NULL placeholders, and execution error reporting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::create_music_pool;
use sqlwrite::conversation::UsageStats;
use sqlwrite::database::SqliteIntrospector;
use sqlwrite::errors::{AppError, ErrorCode};
use sqlwrite::render::{
    render_rows, write_back_translation, write_back_translation_failure, write_translation,
    write_usage,
};

#[tokio::test]
async fn test_render_rows_writes_delimited_lines() {
    let db = SqliteIntrospector::new(create_music_pool().await);
    let mut out = Vec::new();

    let rendered = render_rows(
        &db,
        "SELECT AlbumId, Title, Price FROM Album WHERE ArtistId = 1 ORDER BY AlbumId",
        &mut out,
    )
    .await
    .unwrap();

    assert_eq!(rendered, 3);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "1|For Those About To Rock We Salute You|9.99\n\
         2|Let There Be Rock|8.99\n\
         3|Back in Black|NULL\n"
    );
}

#[tokio::test]
async fn test_render_rows_empty_result_writes_nothing() {
    let db = SqliteIntrospector::new(create_music_pool().await);
    let mut out = Vec::new();

    let rendered = render_rows(&db, "SELECT * FROM Album WHERE 0", &mut out)
        .await
        .unwrap();

    assert_eq!(rendered, 0);
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_render_rows_reports_execution_error() {
    let db = SqliteIntrospector::new(create_music_pool().await);
    let mut out = Vec::new();

    let error = render_rows(&db, "SELECT Missing FROM Album", &mut out)
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::ExecutionError);
    assert!(error.message.starts_with("Error executing SQL statement:"));
    assert!(error.message.contains("no such column"));
    assert!(out.is_empty());
}

#[test]
fn test_report_lines() {
    let mut out = Vec::new();
    write_translation(&mut out, "SELECT 1").unwrap();
    write_back_translation(&mut out, "What is one?").unwrap();
    write_back_translation_failure(&mut out, &AppError::back_translation("no Translation field"))
        .unwrap();
    write_usage(
        &mut out,
        &UsageStats {
            prompt_tokens: 20,
            completion_tokens: 10,
            total_tokens: 30,
        },
    )
    .unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "(SQLwrite translation to SQL: SELECT 1)\n\
         (SQLwrite back-translation: What is one?)\n\
         (SQLwrite back-translation unavailable: no Translation field)\n\
         (tokens: prompt=20, completion=10, total=30)\n"
    );
}
