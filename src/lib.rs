// ABOUTME: Main library entry point for the SQLwrite natural-language query pipeline
// ABOUTME: Translates questions into validated SQLite queries with a language model as oracle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

#![deny(unsafe_code)]

//! # SQLwrite
//!
//! Turns a natural-language question and a live `SQLite` schema into a query
//! that has been checked against the database before it is shown.
//!
//! ## Architecture
//!
//! - **`conversation`**: message history, usage accounting, validated `send()`
//! - **`prompt`**: schema, index, and sample-value context for the model
//! - **`translation`**: the shape-driven retry loop and back-translation
//! - **`render`**: row and suggestion output
//! - **`database`**: the narrow capability over a shared `SQLite` handle
//! - **`llm`**: the provider seam and an `OpenAI`-compatible transport
//! - **`service`**: the `ask` and `sqlwrite` entry points
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sqlwrite::config::{ProviderConfig, TranslatorConfig};
//! use sqlwrite::database::open_pool;
//! use sqlwrite::errors::AppResult;
//! use sqlwrite::service::SqlWrite;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let pool = open_pool(Path::new("chinook.sqlite"), false).await?;
//!     let service = SqlWrite::connect(
//!         pool,
//!         None,
//!         &ProviderConfig::from_env(),
//!         TranslatorConfig::from_env(),
//!     )?;
//!     let mut out = std::io::stdout();
//!     service.ask("Which artists have more than ten albums?", &mut out).await?;
//!     Ok(())
//! }
//! ```

/// Configuration management
pub mod config;

/// Application constants
pub mod constants;

/// Conversation client with bounded retries
pub mod conversation;

/// Database capability and `SQLite` implementation
pub mod database;

/// Unified error handling
pub mod errors;

/// Language-model provider abstraction
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Column obfuscation utility
pub mod obfuscate;

/// Prompt construction
pub mod prompt;

/// Result rendering
pub mod render;

/// Invocation surface
pub mod service;

/// Translation orchestration
pub mod translation;
