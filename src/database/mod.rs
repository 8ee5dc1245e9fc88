// ABOUTME: Narrow database capability consumed by the translation pipeline
// ABOUTME: Describes schema metadata, text column sampling, dry-run probes, and row iteration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

//! # Database Introspection
//!
//! The pipeline never owns a connection. It talks to the database through
//! [`DatabaseIntrospector`], which a caller implements over a shared handle.
//! [`SqliteIntrospector`] is the implementation backed by a `sqlx` pool.

mod sqlite;

pub use sqlite::{open_pool, quote_identifier, SqliteIntrospector};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;

/// One result row; `None` marks a NULL cell
pub type Row = Vec<Option<String>>;

/// A table or view and its creation statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table or view name
    pub name: String,
    /// `CREATE` statement as stored in the catalog
    pub sql: String,
}

/// An index and its creation statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Index name
    pub name: String,
    /// Table the index belongs to
    pub table: String,
    /// `CREATE INDEX` statement as stored in the catalog
    pub sql: String,
}

/// A text-typed column of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Owning table
    pub table: String,
    /// Column name
    pub column: String,
}

/// Capability interface over an externally owned database handle
#[async_trait]
pub trait DatabaseIntrospector: Send + Sync {
    /// Tables and views with their creation statements, in catalog order
    async fn tables(&self) -> AppResult<Vec<TableDefinition>>;

    /// Indexes that have a creation statement
    async fn indexes(&self) -> AppResult<Vec<IndexDefinition>>;

    /// Columns whose declared type is textual
    async fn text_columns(&self) -> AppResult<Vec<ColumnRef>>;

    /// Up to `limit` distinct non-NULL values of one column, in random order
    async fn sample_values(&self, column: &ColumnRef, limit: u32) -> AppResult<Vec<String>>;

    /// Run `sql` to completion, discarding rows and any changes it makes
    async fn execute_discard(&self, sql: &str) -> AppResult<()>;

    /// Run `sql` and collect every row
    async fn execute_rows(&self, sql: &str) -> AppResult<Vec<Row>>;

    /// Run `sql` and count its rows without keeping them
    async fn count_rows(&self, sql: &str) -> AppResult<usize>;
}
