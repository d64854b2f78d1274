// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level triage configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TriageConfig {
    /// Classification provider settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Batch ingestion settings.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Query/update HTTP surface settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// OpenAI-compatible chat completions endpoint used for classification.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// API key. `None` falls back to the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier sent with each request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Full URL of the chat completions endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens in the classification reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries on transient HTTP statuses (429/500/503). Zero means a single attempt.
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }
}

fn default_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    500
}

fn default_timeout_secs() -> u64 {
    60
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("triage").join("triage.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("triage.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// What the pipeline does when a single row fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the run on the first row error.
    #[default]
    FailFast,
    /// Record the row error, skip the row, and keep going.
    Collect,
}

/// Batch ingestion configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Number of staged records committed per transaction.
    #[serde(default = "default_checkpoint_size")]
    pub checkpoint_size: usize,

    /// Skip-vs-abort behavior for row-level failures.
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Upper bound on a whole batch run, in seconds. `None` means unbounded.
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            checkpoint_size: default_checkpoint_size(),
            failure_policy: FailurePolicy::default(),
            run_timeout_secs: None,
        }
    }
}

fn default_checkpoint_size() -> usize {
    10
}

/// HTTP query/update surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level for workspace crates (trace, debug, info, warn, error).
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
