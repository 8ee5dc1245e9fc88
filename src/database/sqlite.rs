// ABOUTME: SQLite implementation of the database capability over a shared sqlx pool
// ABOUTME: Reads sqlite_master and PRAGMA table_info, samples text columns, and renders rows as text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row as _, SqlitePool, TypeInfo, ValueRef};
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

use super::{ColumnRef, DatabaseIntrospector, IndexDefinition, Row, TableDefinition};
use crate::errors::{AppError, AppResult};

/// Declared-type fragments that make a column text-typed
const TEXT_TYPE_MARKERS: [&str; 3] = ["CHAR", "CLOB", "TEXT"];

/// Open a single-connection pool on a database file
///
/// # Errors
///
/// Returns `DatabaseError` if the file cannot be opened.
pub async fn open_pool(path: &Path, create_if_missing: bool) -> AppResult<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create_if_missing);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    debug!("Opened database {}", path.display());
    Ok(pool)
}

/// [`DatabaseIntrospector`] backed by a caller-owned `SqlitePool`
#[derive(Debug, Clone)]
pub struct SqliteIntrospector {
    pool: SqlitePool,
}

impl SqliteIntrospector {
    /// Wrap a pool; the handle is shared, not owned
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn table_names(&self) -> AppResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| row.try_get("name").map_err(AppError::from))
            .collect()
    }
}

/// Quote an identifier for interpolation into SQL text
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn is_text_type(declared: &str) -> bool {
    let upper = declared.to_uppercase();
    TEXT_TYPE_MARKERS.iter().any(|marker| upper.contains(marker))
}

/// Render one cell the way the SQLite shell does; BLOBs become `x'..'` literals
fn render_cell(row: &SqliteRow, index: usize) -> Result<Option<String>, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(None);
    }
    if raw.type_info().name() == "BLOB" {
        let bytes: Vec<u8> = row.try_get(index)?;
        let mut literal = String::with_capacity(bytes.len() * 2 + 3);
        literal.push_str("x'");
        for byte in bytes {
            let _ = write!(literal, "{byte:02x}");
        }
        literal.push('\'');
        return Ok(Some(literal));
    }
    // SQLite converts integers and reals to their text form on request.
    row.try_get_unchecked::<String, _>(index).map(Some)
}

fn render_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    (0..row.len()).map(|index| render_cell(row, index)).collect()
}

#[async_trait]
impl DatabaseIntrospector for SqliteIntrospector {
    async fn tables(&self) -> AppResult<Vec<TableDefinition>> {
        let rows = sqlx::query(
            "SELECT name, sql FROM sqlite_master \
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' AND sql IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> AppResult<TableDefinition> {
                Ok(TableDefinition {
                    name: row.try_get("name")?,
                    sql: row.try_get("sql")?,
                })
            })
            .collect()
    }

    async fn indexes(&self) -> AppResult<Vec<IndexDefinition>> {
        let rows = sqlx::query(
            "SELECT name, tbl_name, sql FROM sqlite_master WHERE type = 'index' AND sql IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> AppResult<IndexDefinition> {
                Ok(IndexDefinition {
                    name: row.try_get("name")?,
                    table: row.try_get("tbl_name")?,
                    sql: row.try_get("sql")?,
                })
            })
            .collect()
    }

    async fn text_columns(&self) -> AppResult<Vec<ColumnRef>> {
        let mut columns = Vec::new();
        for table in self.table_names().await? {
            let pragma = format!("PRAGMA table_info({})", quote_identifier(&table));
            let rows = sqlx::query(&pragma).fetch_all(&self.pool).await?;
            for row in &rows {
                let declared: Option<String> = row.try_get("type")?;
                if declared.as_deref().is_some_and(is_text_type) {
                    columns.push(ColumnRef {
                        table: table.clone(),
                        column: row.try_get("name")?,
                    });
                }
            }
        }
        Ok(columns)
    }

    async fn sample_values(&self, column: &ColumnRef, limit: u32) -> AppResult<Vec<String>> {
        let name = quote_identifier(&column.column);
        let sql = format!(
            "SELECT DISTINCT {name} FROM {} WHERE {name} IS NOT NULL ORDER BY RANDOM() LIMIT ?",
            quote_identifier(&column.table)
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        let mut values = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(value) = render_cell(row, 0)? {
                values.push(value);
            }
        }
        Ok(values)
    }

    async fn execute_discard(&self, sql: &str) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let outcome = sqlx::query(sql).persistent(false).execute(&mut *tx).await;
        tx.rollback().await?;
        outcome?;
        Ok(())
    }

    async fn execute_rows(&self, sql: &str) -> AppResult<Vec<Row>> {
        let rows = sqlx::query(sql)
            .persistent(false)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| render_row(row).map_err(AppError::from))
            .collect()
    }

    async fn count_rows(&self, sql: &str) -> AppResult<usize> {
        let mut tx = self.pool.begin().await?;
        let counted = {
            let mut stream = sqlx::query(sql).persistent(false).fetch(&mut *tx);
            let mut count = 0_usize;
            loop {
                match stream.try_next().await {
                    Ok(Some(_)) => count += 1,
                    Ok(None) => break Ok(count),
                    Err(error) => break Err(error),
                }
            }
        };
        tx.rollback().await?;
        counted.map_err(AppError::from)
    }
}
