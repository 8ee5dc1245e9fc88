// ABOUTME: Schema snapshot collection and instruction assembly for the translation oracle
// ABOUTME: Serializes tables, indexes, and filtered sample values into a single prompt string
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

//! # Prompt Builder
//!
//! [`SchemaDescriptor::collect`] takes a fresh snapshot of the database
//! through a [`DatabaseIntrospector`]. [`build_prompt`] turns the snapshot and
//! a question into the instruction sent to the model; it refuses to proceed
//! when the database has no tables or views.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use tracing::debug;

use crate::config::{TranslationFeatures, TranslatorConfig};
use crate::constants::limits;
use crate::database::{DatabaseIntrospector, IndexDefinition, TableDefinition};
use crate::errors::{AppError, AppResult};
use crate::llm::prompts;

/// Sampled values keyed by table, then column
pub type SampleMap = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Snapshot of the schema context offered to the model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Tables and views with their creation statements
    pub tables: Vec<TableDefinition>,
    /// Index creation statements
    pub indexes: Vec<IndexDefinition>,
    /// Representative text values per column
    pub samples: SampleMap,
}

impl SchemaDescriptor {
    /// Build a snapshot, honouring the index and sample-value feature flags
    ///
    /// # Errors
    ///
    /// Propagates database failures from the introspector.
    pub async fn collect(
        db: &dyn DatabaseIntrospector,
        config: &TranslatorConfig,
    ) -> AppResult<Self> {
        let tables = db.tables().await?;
        if tables.is_empty() {
            return Ok(Self::default());
        }

        let indexes = if config.features.contains(TranslationFeatures::INDEX_SUGGESTIONS) {
            db.indexes().await?
        } else {
            Vec::new()
        };

        let mut samples = SampleMap::new();
        if config.features.contains(TranslationFeatures::SAMPLE_VALUES) {
            for column in db.text_columns().await? {
                let raw = db
                    .sample_values(&column, config.sample_values_per_column)
                    .await?;
                let kept = filter_samples(raw, config.sample_value_max_len);
                if kept.len() < limits::MIN_USABLE_SAMPLES {
                    continue;
                }
                samples
                    .entry(column.table)
                    .or_default()
                    .insert(column.column, kept);
            }
        }

        debug!(
            tables = tables.len(),
            indexes = indexes.len(),
            sampled_tables = samples.len(),
            "Collected schema snapshot"
        );
        Ok(Self {
            tables,
            indexes,
            samples,
        })
    }

    /// Whether the snapshot has no tables or views
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Drop numeric values, truncate the rest to `max_len` characters, and keep
/// the first occurrence of each truncated value
#[must_use]
pub fn filter_samples(values: Vec<String>, max_len: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| !is_numeric(value))
        .map(|value| truncate_chars(value, max_len))
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

fn is_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    // "inf" and "NaN" parse as floats but are words here.
    trimmed.parse::<i64>().is_ok()
        || (trimmed.parse::<f64>().is_ok() && trimmed.bytes().any(|b| b.is_ascii_digit()))
}

fn truncate_chars(mut value: String, max_len: usize) -> String {
    if let Some((cut, _)) = value.char_indices().nth(max_len) {
        value.truncate(cut);
    }
    value
}

fn append_schema_lines(prompt: &mut String, schema: &SchemaDescriptor) {
    for table in &schema.tables {
        let _ = writeln!(prompt, "Schema for {}: {}", table.name, table.sql);
    }
}

/// Assemble the translation instruction for `question`
///
/// # Errors
///
/// Returns `NoSchemaAvailable` when the snapshot has no tables or views, and a
/// serialization error if the sample map cannot be encoded.
pub fn build_prompt(schema: &SchemaDescriptor, question: &str) -> AppResult<String> {
    if schema.is_empty() {
        return Err(AppError::no_schema_available());
    }

    let mut prompt = prompts::translate_instruction(question);
    append_schema_lines(&mut prompt, schema);

    if !schema.indexes.is_empty() {
        prompt.push_str("\n\nIndexes:\n");
        for index in &schema.indexes {
            let _ = writeln!(prompt, "Index for {}: {}", index.table, index.sql);
        }
    }

    if !schema.samples.is_empty() {
        prompt.push_str("\n\nSample values for text columns, keyed by table then column:\n");
        prompt.push_str(&serde_json::to_string(&schema.samples)?);
        prompt.push('\n');
    }

    Ok(prompt)
}

/// Assemble the instruction asking the model to restate `sql` in English
///
/// # Errors
///
/// Returns `NoSchemaAvailable` when the snapshot has no tables or views.
pub fn build_back_translation_prompt(schema: &SchemaDescriptor, sql: &str) -> AppResult<String> {
    if schema.is_empty() {
        return Err(AppError::no_schema_available());
    }
    let mut prompt = prompts::back_translation_instruction(sql);
    append_schema_lines(&mut prompt, schema);
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn test_filter_excludes_numbers() {
        let kept = filter_samples(owned(&["42", "-3.5", "1e3", "Rock", " 7 ", "inf"]), 32);
        assert_eq!(kept, owned(&["Rock", "inf"]));
    }

    #[test]
    fn test_filter_truncates_by_characters() {
        let kept = filter_samples(owned(&["abcdef", "héllo wörld"]), 4);
        assert_eq!(kept, owned(&["abcd", "héll"]));
    }

    #[test]
    fn test_filter_drops_values_equal_after_truncation() {
        let kept = filter_samples(owned(&["abcdefgh1", "Rock", "abcdefgh2", "Roc"]), 4);
        assert_eq!(kept, owned(&["abcd", "Rock", "Roc"]));
    }

    #[test]
    fn test_truncate_keeps_short_values() {
        assert_eq!(truncate_chars("abc".to_owned(), 32), "abc");
        assert_eq!(truncate_chars("abc".to_owned(), 3), "abc");
    }
}
