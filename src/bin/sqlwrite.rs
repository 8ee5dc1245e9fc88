// ABOUTME: SQLwrite command-line tool translating English questions into SQLite queries
// ABOUTME: Provides ask, translate, and obfuscate subcommands over a database file
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors
//!
//! Usage:
//! ```bash
//! # Answer a question with rows from the database
//! sqlwrite --database chinook.sqlite ask "Which genres have the longest tracks?"
//!
//! # Show the SQL and its English restatement without running it
//! sqlwrite --database chinook.sqlite translate "Top five customers by spend"
//!
//! # Rename every column to F<n> for benchmarking
//! sqlwrite --database copy.sqlite obfuscate
//! ```

use clap::{Parser, Subcommand};
use sqlwrite::config::{
    LogLevel, ModelPreset, ProviderConfig, TranslationFeatures, TranslatorConfig,
};
use sqlwrite::database::open_pool;
use sqlwrite::errors::AppResult;
use sqlwrite::logging::LoggingConfig;
use sqlwrite::obfuscate::obfuscate_columns;
use sqlwrite::render;
use sqlwrite::service::SqlWrite;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "sqlwrite",
    version,
    about = "Translate English questions into SQLite queries",
    long_about = "Translates natural-language questions into SQL with a language model, checks every candidate against the database, and prints the result."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the SQLite database file
    #[arg(long, short = 'd', global = true, default_value = "sqlwrite.sqlite")]
    database: PathBuf,

    /// Model preset or raw model identifier (e.g. gpt-4)
    #[arg(long, global = true)]
    model: Option<String>,

    /// API key (defaults to the OPENAI_API_KEY environment variable)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Leave sampled column values out of the prompt
    #[arg(long, global = true)]
    no_samples: bool,

    /// Leave indexes out of the prompt and skip index suggestions
    #[arg(long, global = true)]
    no_indexes: bool,

    /// Restate the chosen SQL in English after answering
    #[arg(long, global = true)]
    back_translate: bool,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Translate a question, run it, and print the rows
    Ask {
        /// The question, in plain English
        question: String,
    },

    /// Translate a question and print the SQL without running it
    Translate {
        /// The question, in plain English
        question: String,
    },

    /// Rename every column of every table to F<cid>
    Obfuscate,
}

impl Cli {
    fn translator_config(&self) -> TranslatorConfig {
        let mut config = TranslatorConfig::from_env();
        if let Some(model) = &self.model {
            config = match ModelPreset::parse(model) {
                Some(preset) => config.with_preset(preset),
                None => TranslatorConfig {
                    model: model.clone(),
                    ..config
                },
            };
        }
        if self.no_samples {
            config = config.with_feature(TranslationFeatures::SAMPLE_VALUES, false);
        }
        if self.no_indexes {
            config = config.with_feature(TranslationFeatures::INDEX_SUGGESTIONS, false);
        }
        if self.back_translate {
            config = config.with_feature(TranslationFeatures::BACK_TRANSLATION, true);
        }
        config
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let pool = open_pool(&cli.database, false).await?;

    if matches!(cli.command, Command::Obfuscate) {
        let mappings = obfuscate_columns(&pool).await?;
        for mapping in &mappings {
            for (original, renamed) in &mapping.columns {
                println!("{}.{original} -> {renamed}", mapping.table);
            }
        }
        return Ok(());
    }

    let config = cli.translator_config();
    let service = SqlWrite::connect(
        pool,
        cli.api_key.as_deref(),
        &ProviderConfig::from_env(),
        config,
    )?;

    let mut out = io::stdout();
    let report = match &cli.command {
        Command::Ask { question } => service.ask(question, &mut out).await?,
        Command::Translate { question } => service.sqlwrite(question, &mut out).await?,
        Command::Obfuscate => return Ok(()),
    };

    info!(
        iterations = report.outcome.iterations,
        accepted = report.outcome.accepted,
        "Request finished"
    );
    render::write_usage(&mut io::stderr(), &report.usage)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        logging = logging.with_level(LogLevel::Debug);
    }
    if let Err(e) = logging.init() {
        eprintln!("SQLwrite: failed to initialize logging: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = ?e.code, "{e}");
            eprintln!("SQLwrite: {}", e.message);
            ExitCode::FAILURE
        }
    }
}
