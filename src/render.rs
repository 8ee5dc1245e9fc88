// ABOUTME: Result renderer writing query rows, index suggestions, and usage lines to a sink
// ABOUTME: Executes the final SQL once and joins each row's cells with the shell delimiter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

use std::io::{self, Write};
use tracing::{debug, error};

use crate::constants::output::{CELL_DELIMITER, NULL_PLACEHOLDER};
use crate::conversation::UsageStats;
use crate::database::DatabaseIntrospector;
use crate::errors::{AppError, AppResult};

fn sink_error(error: io::Error) -> AppError {
    AppError::internal(format!("Failed to write output: {error}")).with_source(error)
}

/// Join one row's cells, printing NULL cells as the placeholder
#[must_use]
pub fn format_row(row: &[Option<String>]) -> String {
    row.iter()
        .map(|cell| cell.as_deref().unwrap_or(NULL_PLACEHOLDER))
        .collect::<Vec<_>>()
        .join(CELL_DELIMITER)
}

/// Execute `sql` and write every row to `sink`
///
/// Not retried: the statement already passed a dry-run, so a failure here is
/// reported as-is.
///
/// # Errors
///
/// Returns `ExecutionError` when the statement fails, or an internal error
/// when the sink cannot be written.
pub async fn render_rows<W: Write>(
    db: &dyn DatabaseIntrospector,
    sql: &str,
    sink: &mut W,
) -> AppResult<usize> {
    let rows = db.execute_rows(sql).await.map_err(|e| {
        error!("Error executing SQL statement: {}", e.message);
        AppError::execution(format!("Error executing SQL statement: {}", e.message))
            .with_source(e)
    })?;
    for row in &rows {
        writeln!(sink, "{}", format_row(row)).map_err(sink_error)?;
    }
    debug!(rows = rows.len(), "Rendered result rows");
    Ok(rows.len())
}

/// Write the chosen SQL
///
/// # Errors
///
/// Returns an internal error when the sink cannot be written.
pub fn write_translation<W: Write>(sink: &mut W, sql: &str) -> AppResult<()> {
    writeln!(sink, "(SQLwrite translation to SQL: {sql})").map_err(sink_error)
}

/// Write index suggestions, if there are any
///
/// # Errors
///
/// Returns an internal error when the sink cannot be written.
pub fn write_index_suggestions<W: Write>(sink: &mut W, suggestions: &[String]) -> AppResult<()> {
    if suggestions.is_empty() {
        return Ok(());
    }
    writeln!(sink, "Indexing suggestions:").map_err(sink_error)?;
    for suggestion in suggestions {
        writeln!(sink, "  {suggestion}").map_err(sink_error)?;
    }
    Ok(())
}

/// Write the natural-language restatement of the chosen SQL
///
/// # Errors
///
/// Returns an internal error when the sink cannot be written.
pub fn write_back_translation<W: Write>(sink: &mut W, text: &str) -> AppResult<()> {
    writeln!(sink, "(SQLwrite back-translation: {text})").map_err(sink_error)
}

/// Report a failed restatement without disturbing earlier output
///
/// # Errors
///
/// Returns an internal error when the sink cannot be written.
pub fn write_back_translation_failure<W: Write>(sink: &mut W, error: &AppError) -> AppResult<()> {
    writeln!(sink, "(SQLwrite back-translation unavailable: {})", error.message)
        .map_err(sink_error)
}

/// Write a one-line token usage summary
///
/// # Errors
///
/// Returns an internal error when the sink cannot be written.
pub fn write_usage<W: Write>(sink: &mut W, usage: &UsageStats) -> AppResult<()> {
    writeln!(
        sink,
        "(tokens: prompt={}, completion={}, total={})",
        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    )
    .map_err(sink_error)
}
