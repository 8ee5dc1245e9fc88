// ABOUTME: Application-wide constants for retry budgets, sampling limits, and env variable names
// ABOUTME: Single source of default values consumed by the configuration layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SQLwrite Contributors

//! Application constants organized by concern

/// Service identity used in structured logs
pub mod service_names {
    /// Name reported by the logging layer
    pub const SQLWRITE: &str = "sqlwrite";
}

/// Environment variable names
pub mod env_vars {
    /// Default variable holding the provider API key
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    /// Provider base URL override
    pub const BASE_URL: &str = "SQLWRITE_BASE_URL";
    /// Model identifier override
    pub const MODEL: &str = "SQLWRITE_MODEL";
    /// Structural retry budget override
    pub const MAX_RETRIES: &str = "SQLWRITE_MAX_RETRIES";
    /// Shape retry budget override
    pub const MAX_SHAPE_RETRIES: &str = "SQLWRITE_MAX_SHAPE_RETRIES";
    /// Large-result threshold override
    pub const LARGE_RESULT_THRESHOLD: &str = "SQLWRITE_LARGE_RESULT_THRESHOLD";
    /// Number of sampled values per text column
    pub const SAMPLE_VALUES: &str = "SQLWRITE_SAMPLE_VALUES";
    /// Maximum characters kept per sampled value
    pub const SAMPLE_MAX_LEN: &str = "SQLWRITE_SAMPLE_MAX_LEN";
    /// Comma-separated feature list
    pub const FEATURES: &str = "SQLWRITE_FEATURES";
    /// Validator feedback strategy (`silent` or `append`)
    pub const FEEDBACK: &str = "SQLWRITE_FEEDBACK";
    /// Log output format (`json`, `pretty`, `compact`)
    pub const LOG_FORMAT: &str = "SQLWRITE_LOG_FORMAT";
    /// Include source locations in log lines
    pub const LOG_LOCATION: &str = "SQLWRITE_LOG_LOCATION";
}

/// Model identifiers
pub mod models {
    /// GPT-3.5 chat model
    pub const GPT_35: &str = "gpt-3.5-turbo";
    /// GPT-4 chat model
    pub const GPT_4: &str = "gpt-4";
}

/// Translation defaults
pub mod limits {
    /// Malformed or rejected responses tolerated inside one `send()`
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    /// Shape-driven outer iterations
    pub const DEFAULT_MAX_SHAPE_RETRIES: u32 = 5;
    /// Row count at or above which a result is considered too large
    pub const DEFAULT_LARGE_RESULT_THRESHOLD: usize = 10;
    /// Distinct random values drawn per text column
    pub const DEFAULT_SAMPLE_VALUES: u32 = 5;
    /// Characters kept per sampled value
    pub const DEFAULT_SAMPLE_MAX_LEN: usize = 32;
    /// Columns with fewer usable samples are left out of the prompt
    pub const MIN_USABLE_SAMPLES: usize = 2;
}

/// HTTP transport defaults
pub mod network {
    /// Default `OpenAI` API endpoint
    pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
    /// Connection timeout
    pub const CONNECT_TIMEOUT_SECS: u64 = 30;
    /// Whole-request timeout
    pub const REQUEST_TIMEOUT_SECS: u64 = 120;
}

/// Rendering of result rows
pub mod output {
    /// Separator between cells of one row
    pub const CELL_DELIMITER: &str = "|";
    /// Placeholder printed for NULL cells
    pub const NULL_PLACEHOLDER: &str = "NULL";
}
