// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch ingestion for healthcare inbox triage.
//!
//! Reads candidate rows from a CSV source, classifies each message through a
//! [`MessageClassifier`](triage_core::MessageClassifier), and persists the
//! results in checkpoint groups through a
//! [`StorageAdapter`](triage_core::StorageAdapter). Stored records can be
//! classified again with [`reclassify`].

pub mod pipeline;
pub mod reclassify;
pub mod report;
pub mod source;

pub use pipeline::BatchPipeline;
pub use reclassify::reclassify;
pub use report::{BatchReport, BatchState, IngestErrorKind, RowError};
pub use source::{CsvSource, RawRow, ValidRow};
