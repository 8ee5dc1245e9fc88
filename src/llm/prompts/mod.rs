// ABOUTME: Prompt texts for the translation oracle loaded at compile time
// ABOUTME: Provides the SQL assistant system prompt, instruction templates, and question hints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

//! # Prompts
//!
//! Long prompt texts live in markdown files next to this module and are
//! embedded at compile time. Templates carry a single `{question}` or `{sql}`
//! placeholder filled by the prompt builder.

/// System message sent ahead of every translation request
pub const SQL_ASSISTANT_SYSTEM_PROMPT: &str = include_str!("sql_assistant_system.md");

/// Task statement and output contract for natural language to SQL
pub const TRANSLATE_INSTRUCTION_TEMPLATE: &str = include_str!("translate_instruction.md");

/// Task statement and output contract for SQL to natural language
pub const BACK_TRANSLATION_TEMPLATE: &str = include_str!("back_translation.md");

/// Placeholder replaced by the user's question
pub const QUESTION_PLACEHOLDER: &str = "{question}";

/// Placeholder replaced by the SQL being restated
pub const SQL_PLACEHOLDER: &str = "{sql}";

/// Appended once to the question after a query returned no rows
pub const RELAX_HINT: &str = " Relax the query to match more results: use fuzzy matching with LIKE and case-insensitive comparisons, and loosen inequalities.";

/// Appended once to the question after a query returned too many rows
pub const CONSTRAIN_HINT: &str =
    " Constrain the query to produce fewer results: tighten the conditions, combining them with INTERSECT where useful.";

/// Fill the translation template with a question
#[must_use]
pub fn translate_instruction(question: &str) -> String {
    TRANSLATE_INSTRUCTION_TEMPLATE.replacen(QUESTION_PLACEHOLDER, question, 1)
}

/// Fill the back-translation template with a SQL statement
#[must_use]
pub fn back_translation_instruction(sql: &str) -> String {
    BACK_TRANSLATION_TEMPLATE.replacen(SQL_PLACEHOLDER, sql, 1)
}
