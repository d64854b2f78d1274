// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checkpointed batch ingestion.
//!
//! Rows are validated, de-duplicated, classified and staged strictly in input
//! order. Staged records are committed in groups of `checkpoint_size`, one
//! transaction per group. An abort discards the uncommitted group; groups
//! committed earlier stay durable.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use triage_config::{FailurePolicy, IngestConfig};
use triage_core::timestamp::now_for_storage;
use triage_core::{MessageClassifier, MessageRecord, StorageAdapter, TriageError};

use crate::report::{BatchReport, BatchState, IngestErrorKind, RowError};
use crate::source::{CsvSource, RawRow};

/// Callback invoked after every committed checkpoint with the running total.
pub type ProgressFn = Box<dyn Fn(usize) + Send + Sync>;

/// Runs batches of rows through classification into storage.
pub struct BatchPipeline {
    classifier: Arc<dyn MessageClassifier>,
    storage: Arc<dyn StorageAdapter>,
    config: IngestConfig,
    on_checkpoint: Option<ProgressFn>,
}

/// Records staged for the next checkpoint, with their row numbers and
/// whether each carries the fallback classification.
#[derive(Default)]
struct Checkpoint {
    records: Vec<MessageRecord>,
    meta: Vec<(usize, bool)>,
}

impl Checkpoint {
    fn push(&mut self, row: usize, record: MessageRecord, fallback: bool) {
        self.records.push(record);
        self.meta.push((row, fallback));
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn remove(&mut self, message_id: &str) -> Option<usize> {
        let idx = self
            .records
            .iter()
            .position(|r| r.message_id == message_id)?;
        self.records.remove(idx);
        Some(self.meta.remove(idx).0)
    }

    fn fallbacks(&self) -> usize {
        self.meta.iter().filter(|(_, fallback)| *fallback).count()
    }

    fn clear(&mut self) {
        self.records.clear();
        self.meta.clear();
    }
}

/// Whether the run continues after a row failure.
enum Flow {
    Continue,
    Abort(RowError),
}

impl BatchPipeline {
    pub fn new(
        classifier: Arc<dyn MessageClassifier>,
        storage: Arc<dyn StorageAdapter>,
        config: IngestConfig,
    ) -> Self {
        Self {
            classifier,
            storage,
            config,
            on_checkpoint: None,
        }
    }

    pub fn with_progress(mut self, on_checkpoint: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_checkpoint = Some(Box::new(on_checkpoint));
        self
    }

    /// Opens a CSV file and runs it. A source that cannot be opened yields an
    /// aborted report with nothing committed.
    pub async fn run_csv(&self, path: &Path) -> BatchReport {
        info!(path = %path.display(), "starting batch run");
        match CsvSource::open(path).await {
            Ok(source) => self.run(source).await,
            Err(e) => {
                warn!(error = %e, "batch source unavailable");
                let mut report = BatchReport::new();
                report.state = BatchState::Running;
                abort(report, RowError::from_error(&e, None, None))
            }
        }
    }

    /// Runs an ordered sequence of rows to completion or abort.
    pub async fn run<I>(&self, rows: I) -> BatchReport
    where
        I: IntoIterator<Item = Result<RawRow, TriageError>>,
    {
        let mut report = BatchReport::new();
        report.state = BatchState::Running;

        let checkpoint_size = self.config.checkpoint_size.max(1);
        let run_timeout = self.config.run_timeout_secs.map(Duration::from_secs);
        let deadline = run_timeout.map(|limit| Instant::now() + limit);
        let mut staged = Checkpoint::default();
        let mut seen: HashSet<String> = HashSet::new();

        for (idx, item) in rows.into_iter().enumerate() {
            report.rows_seen += 1;

            if let (Some(deadline), Some(limit)) = (deadline, run_timeout)
                && Instant::now() >= deadline
            {
                return abort(report, timeout_error(limit, None, None));
            }

            let raw = match item {
                Ok(raw) => raw,
                Err(e) => {
                    let row = match &e {
                        TriageError::RowValidation { row, .. } => *row,
                        _ => idx + 1,
                    };
                    match self.row_failure(&mut report, &e, row, None) {
                        Flow::Continue => continue,
                        Flow::Abort(err) => return abort(report, err),
                    }
                }
            };
            let row = if raw.row == 0 { idx + 1 } else { raw.row };
            let raw = RawRow { row, ..raw };

            let valid = match raw.validate() {
                Ok(valid) => valid,
                Err(e) => match self.row_failure(&mut report, &e, row, None) {
                    Flow::Continue => continue,
                    Flow::Abort(err) => return abort(report, err),
                },
            };

            let duplicate = if seen.contains(&valid.message_id) {
                true
            } else {
                match self.storage.contains(&valid.message_id).await {
                    Ok(found) => found,
                    Err(e) => {
                        let err = RowError {
                            kind: IngestErrorKind::StorageCommit,
                            row: Some(row),
                            message_id: Some(valid.message_id.clone()),
                            message: e.to_string(),
                        };
                        return abort(report, err);
                    }
                }
            };
            if duplicate {
                let e = TriageError::UniqueConstraint {
                    message_id: valid.message_id.clone(),
                };
                match self.row_failure(&mut report, &e, row, Some(&valid.message_id)) {
                    Flow::Continue => continue,
                    Flow::Abort(err) => return abort(report, err),
                }
            }

            debug!(row, message_id = %valid.message_id, "classifying");
            let classify = self.classifier.classify(&valid.subject, &valid.content);
            let outcome = match (deadline, run_timeout) {
                (Some(deadline), Some(limit)) => {
                    match tokio::time::timeout_at(deadline, classify).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            return abort(
                                report,
                                timeout_error(limit, Some(row), Some(&valid.message_id)),
                            );
                        }
                    }
                }
                _ => classify.await,
            };
            if let Some(reason) = outcome.fallback_reason() {
                warn!(
                    row,
                    message_id = %valid.message_id,
                    reason = reason.kind(),
                    "classification fell back to default"
                );
            }

            let record = MessageRecord::new(
                valid.message_id.clone(),
                valid.subject,
                valid.content,
                valid.occurred_at,
                outcome.classification(),
                now_for_storage(),
            );
            seen.insert(valid.message_id);
            staged.push(row, record, outcome.is_fallback());

            if staged.len() >= checkpoint_size
                && let Err(err) = self.commit(&mut staged, &mut report).await
            {
                return abort(report, err);
            }
        }

        if !staged.is_empty()
            && let Err(err) = self.commit(&mut staged, &mut report).await
        {
            return abort(report, err);
        }

        report.state = BatchState::Completed;
        info!(
            committed = report.committed,
            rows_seen = report.rows_seen,
            fallbacks = report.fallbacks,
            skipped = report.row_errors.len(),
            "batch run completed"
        );
        report
    }

    /// Applies the failure policy to a row-level error.
    fn row_failure(
        &self,
        report: &mut BatchReport,
        err: &TriageError,
        row: usize,
        message_id: Option<&str>,
    ) -> Flow {
        let error = RowError::from_error(err, Some(row), message_id);
        if error.kind.is_row_level() && self.config.failure_policy == FailurePolicy::Collect {
            warn!(row, kind = %error.kind, error = %err, "skipping row");
            report.row_errors.push(error);
            Flow::Continue
        } else {
            Flow::Abort(error)
        }
    }

    /// Commits the staged group in one transaction.
    ///
    /// Under `collect`, a unique violation drops the offending record and the
    /// commit is retried with the rest of the group.
    async fn commit(
        &self,
        staged: &mut Checkpoint,
        report: &mut BatchReport,
    ) -> Result<(), RowError> {
        loop {
            match self.storage.commit_group(&staged.records).await {
                Ok(()) => {
                    report.committed += staged.len();
                    report.fallbacks += staged.fallbacks();
                    staged.clear();
                    info!(
                        committed = report.committed,
                        rows_seen = report.rows_seen,
                        "checkpoint committed"
                    );
                    if let Some(on_checkpoint) = &self.on_checkpoint {
                        on_checkpoint(report.committed);
                    }
                    return Ok(());
                }
                Err(TriageError::UniqueConstraint { message_id }) => {
                    let e = TriageError::UniqueConstraint {
                        message_id: message_id.clone(),
                    };
                    let Some(row) = staged.remove(&message_id) else {
                        return Err(RowError::from_error(&e, None, None));
                    };
                    match self.row_failure(report, &e, row, Some(&message_id)) {
                        Flow::Continue if staged.is_empty() => return Ok(()),
                        Flow::Continue => continue,
                        Flow::Abort(err) => return Err(err),
                    }
                }
                Err(e) => {
                    return Err(RowError {
                        kind: IngestErrorKind::StorageCommit,
                        row: None,
                        message_id: None,
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

fn timeout_error(limit: Duration, row: Option<usize>, message_id: Option<&str>) -> RowError {
    RowError::from_error(&TriageError::Timeout { duration: limit }, row, message_id)
}

fn abort(report: BatchReport, error: RowError) -> BatchReport {
    warn!(
        committed = report.committed,
        rows_seen = report.rows_seen,
        error = %error,
        "batch run aborted, uncommitted group discarded"
    );
    report.abort_with(error)
}
