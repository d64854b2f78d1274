// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for healthcare inbox triage.
//!
//! Provides the domain types (categories, confidence, message records),
//! the error type, and the adapter traits implemented by the provider,
//! classifier and storage crates.

pub mod error;
pub mod timestamp;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TriageError;
pub use types::{
    AdapterType, CategoryStats, Classification, ClassificationOutcome, Confidence,
    FallbackReason, HealthStatus, MessageRecord, RecordFilter, RecordPatch, TriageCategory,
};

pub use traits::{MessageClassifier, PluginAdapter, ProviderAdapter, StorageAdapter};
