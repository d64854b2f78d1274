// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the triage workspace.

use thiserror::Error;

/// The primary error type used across adapter traits and core operations.
///
/// Classification failures never appear here: the classifier absorbs them
/// into a fallback outcome. Everything past that point is reported through
/// this type.
#[derive(Debug, Error)]
pub enum TriageError {
    /// Configuration errors (invalid TOML, missing API key, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors outside a checkpoint commit (open, query, migrate).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A checkpoint group could not be committed. The group was rolled back.
    #[error("storage commit failed: {source}")]
    StorageCommit {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A record with this `message_id` already exists.
    #[error("duplicate message_id `{message_id}`")]
    UniqueConstraint { message_id: String },

    /// An input row is malformed (missing field, bad timestamp, bad CSV record).
    #[error("invalid row {row}: {reason}")]
    RowValidation { row: usize, reason: String },

    /// The batch source could not be opened or read.
    #[error("batch source error: {message}")]
    Source {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Classification provider errors (HTTP failure, bad status, malformed envelope).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No record matches the requested `message_id`.
    #[error("message not found: {message_id}")]
    NotFound { message_id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TriageError {
    /// Wraps any error as a non-commit storage failure.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage {
            source: source.into(),
        }
    }
}
