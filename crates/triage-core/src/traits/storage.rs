// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the message record store.

use async_trait::async_trait;

use crate::error::TriageError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CategoryStats, Classification, MessageRecord, RecordFilter, RecordPatch};

/// Adapter for the durable message record store.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Opens the backend and applies pending migrations.
    async fn initialize(&self) -> Result<(), TriageError>;

    /// Flushes pending writes and releases the connection.
    async fn close(&self) -> Result<(), TriageError>;

    /// Returns true if a record with this `message_id` is stored.
    async fn contains(&self, message_id: &str) -> Result<bool, TriageError>;

    /// Inserts a checkpoint group atomically.
    ///
    /// Either every record is committed or none is. A duplicate id fails with
    /// [`TriageError::UniqueConstraint`]; any other failure with
    /// [`TriageError::StorageCommit`].
    async fn commit_group(&self, records: &[MessageRecord]) -> Result<(), TriageError>;

    /// Fetches one record by `message_id`.
    async fn get(&self, message_id: &str) -> Result<Option<MessageRecord>, TriageError>;

    /// Lists records matching the filter, ordered by `occurred_at`.
    async fn list(&self, filter: &RecordFilter) -> Result<Vec<MessageRecord>, TriageError>;

    /// Applies a partial update. Returns `None` when no record matches.
    async fn update(
        &self,
        message_id: &str,
        patch: &RecordPatch,
    ) -> Result<Option<MessageRecord>, TriageError>;

    /// Total record count and per-category counts.
    async fn stats(&self) -> Result<CategoryStats, TriageError>;

    /// Overwrites the classification of a stored record and appends
    /// `audit_note` to its notes as one write, on a new line when notes
    /// already exist.
    ///
    /// Returns `None` when no record matches.
    async fn apply_reclassification(
        &self,
        message_id: &str,
        classification: &Classification,
        audit_note: &str,
    ) -> Result<Option<MessageRecord>, TriageError>;
}
