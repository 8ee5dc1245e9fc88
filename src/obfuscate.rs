// ABOUTME: Column obfuscation utility for building hint-free benchmark databases
// ABOUTME: Renames every user-table column to F<cid> through a temporary table name
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::database::quote_identifier;
use crate::errors::{AppError, AppResult};

/// Column renames applied to one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMapping {
    /// Table name (unchanged)
    pub table: String,
    /// `(original, obfuscated)` column names in `cid` order
    pub columns: Vec<(String, String)>,
}

async fn exec(conn: &mut SqliteConnection, sql: &str) -> AppResult<()> {
    debug!("{sql}");
    sqlx::query(sql)
        .execute(conn)
        .await
        .map_err(|e| AppError::database(format!("{sql}: {e}")).with_source(e))?;
    Ok(())
}

/// Rename every column of every user table to `F<cid>`
///
/// Each table is renamed to `<name>_temp`, its columns are renamed, and the
/// table is renamed back. Each table is handled in its own transaction, so a
/// failing rename leaves that table untouched.
///
/// # Errors
///
/// Returns `DatabaseError` on the first failing statement.
pub async fn obfuscate_columns(pool: &SqlitePool) -> AppResult<Vec<TableMapping>> {
    let tables: Vec<String> = sqlx::query(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )
    .fetch_all(pool)
    .await?
    .iter()
    .map(|row| row.try_get("name"))
    .collect::<Result<_, _>>()?;

    let mut mappings = Vec::with_capacity(tables.len());
    for table in tables {
        let temp = format!("{table}_temp");
        let mut tx = pool.begin().await?;
        exec(
            &mut tx,
            &format!(
                "ALTER TABLE {} RENAME TO {}",
                quote_identifier(&table),
                quote_identifier(&temp)
            ),
        )
        .await?;

        let info = sqlx::query(&format!("PRAGMA table_info({})", quote_identifier(&temp)))
            .fetch_all(&mut *tx)
            .await?;
        let mut columns = Vec::with_capacity(info.len());
        for row in &info {
            let cid: i64 = row.try_get("cid")?;
            let name: String = row.try_get("name")?;
            columns.push((name, format!("F{cid}")));
        }

        for (original, renamed) in &columns {
            if original == renamed {
                continue;
            }
            exec(
                &mut tx,
                &format!(
                    "ALTER TABLE {} RENAME COLUMN {} TO {}",
                    quote_identifier(&temp),
                    quote_identifier(original),
                    quote_identifier(renamed)
                ),
            )
            .await?;
        }

        exec(
            &mut tx,
            &format!(
                "ALTER TABLE {} RENAME TO {}",
                quote_identifier(&temp),
                quote_identifier(&table)
            ),
        )
        .await?;
        tx.commit().await?;

        info!(table = %table, columns = columns.len(), "Obfuscated table columns");
        mappings.push(TableMapping { table, columns });
    }
    Ok(mappings)
}
