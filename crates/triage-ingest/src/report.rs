// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch run outcome reporting.

use serde::Serialize;
use strum::Display;

use triage_core::TriageError;

/// Lifecycle of one batch run: `Pending -> Running -> {Completed, Aborted}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum BatchState {
    Pending,
    Running,
    Completed,
    Aborted,
}

impl BatchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BatchState::Completed | BatchState::Aborted)
    }
}

/// Pipeline-layer failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IngestErrorKind {
    /// Malformed row: missing field, bad timestamp, or bad CSV record.
    RowValidation,
    /// Duplicate `message_id`.
    UniqueConstraint,
    /// The store failed at checkpoint time.
    StorageCommit,
    /// The batch source could not be opened or read.
    Source,
    /// The run exceeded `ingest.run_timeout_secs`.
    Timeout,
}

impl IngestErrorKind {
    /// Whether the kind may be skipped under the `collect` policy.
    pub fn is_row_level(self) -> bool {
        matches!(
            self,
            IngestErrorKind::RowValidation | IngestErrorKind::UniqueConstraint
        )
    }
}

/// A failure attributed to one row, or to the run as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub kind: IngestErrorKind,
    /// 1-based data row, when the failure belongs to a row.
    pub row: Option<usize>,
    pub message_id: Option<String>,
    pub message: String,
}

impl RowError {
    /// Classifies a [`TriageError`] raised while handling `row`.
    pub fn from_error(err: &TriageError, row: Option<usize>, message_id: Option<&str>) -> Self {
        let kind = match err {
            TriageError::RowValidation { .. } => IngestErrorKind::RowValidation,
            TriageError::UniqueConstraint { .. } => IngestErrorKind::UniqueConstraint,
            TriageError::Source { .. } => IngestErrorKind::Source,
            TriageError::Timeout { .. } => IngestErrorKind::Timeout,
            _ => IngestErrorKind::StorageCommit,
        };
        let message_id = match err {
            TriageError::UniqueConstraint { message_id } => Some(message_id.clone()),
            _ => message_id.map(str::to_string),
        };
        Self {
            kind,
            row,
            message_id,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(row) = self.row {
            write!(f, " at row {row}")?;
        }
        if let Some(id) = &self.message_id {
            write!(f, " ({id})")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Summary of a batch run.
///
/// `committed` only counts records in fully committed checkpoint groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub state: BatchState,
    pub committed: usize,
    /// Data rows read from the source, including failed ones.
    pub rows_seen: usize,
    /// Records persisted with the fallback classification.
    pub fallbacks: usize,
    /// Row errors skipped under the `collect` policy.
    pub row_errors: Vec<RowError>,
    /// The error that stopped the run, when `state` is `Aborted`.
    pub abort: Option<RowError>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self {
            state: BatchState::Pending,
            committed: 0,
            rows_seen: 0,
            fallbacks: 0,
            row_errors: Vec::new(),
            abort: None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.state == BatchState::Aborted
    }

    pub(crate) fn abort_with(mut self, error: RowError) -> Self {
        self.state = BatchState::Aborted;
        self.abort = Some(error);
        self
    }
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new()
    }
}
