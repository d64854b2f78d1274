// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage wrapper that injects commit failures.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::debug;

use triage_core::traits::{PluginAdapter, StorageAdapter};
use triage_core::types::{
    AdapterType, CategoryStats, Classification, HealthStatus, MessageRecord, RecordFilter,
    RecordPatch,
};
use triage_core::TriageError;

/// Delegates to an inner store, except that any commit group containing a
/// poisoned `message_id` fails with [`TriageError::StorageCommit`] and writes
/// nothing.
///
/// With [`FaultyStorage::blind_contains`], `contains` always answers `false`
/// so duplicates only surface when the commit hits the unique key.
pub struct FaultyStorage {
    inner: Arc<dyn StorageAdapter>,
    poisoned: HashSet<String>,
    blind: bool,
    commits: AtomicUsize,
}

impl FaultyStorage {
    pub fn new(inner: Arc<dyn StorageAdapter>) -> Self {
        Self {
            inner,
            poisoned: HashSet::new(),
            blind: false,
            commits: AtomicUsize::new(0),
        }
    }

    pub fn fail_commit_containing(mut self, message_id: &str) -> Self {
        self.poisoned.insert(message_id.to_string());
        self
    }

    pub fn blind_contains(mut self) -> Self {
        self.blind = true;
        self
    }

    /// Number of commit attempts, failed ones included.
    pub fn commit_attempts(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for FaultyStorage {
    fn name(&self) -> &str {
        "faulty"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TriageError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), TriageError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl StorageAdapter for FaultyStorage {
    async fn initialize(&self) -> Result<(), TriageError> {
        self.inner.initialize().await
    }

    async fn close(&self) -> Result<(), TriageError> {
        self.inner.close().await
    }

    async fn contains(&self, message_id: &str) -> Result<bool, TriageError> {
        if self.blind {
            return Ok(false);
        }
        self.inner.contains(message_id).await
    }

    async fn commit_group(&self, records: &[MessageRecord]) -> Result<(), TriageError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        if let Some(bad) = records.iter().find(|r| self.poisoned.contains(&r.message_id)) {
            debug!(message_id = %bad.message_id, "injecting commit failure");
            return Err(TriageError::StorageCommit {
                source: format!("injected failure at {}", bad.message_id).into(),
            });
        }
        self.inner.commit_group(records).await
    }

    async fn get(&self, message_id: &str) -> Result<Option<MessageRecord>, TriageError> {
        self.inner.get(message_id).await
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<MessageRecord>, TriageError> {
        self.inner.list(filter).await
    }

    async fn update(
        &self,
        message_id: &str,
        patch: &RecordPatch,
    ) -> Result<Option<MessageRecord>, TriageError> {
        self.inner.update(message_id, patch).await
    }

    async fn stats(&self) -> Result<CategoryStats, TriageError> {
        self.inner.stats().await
    }

    async fn apply_reclassification(
        &self,
        message_id: &str,
        classification: &Classification,
        audit_note: &str,
    ) -> Result<Option<MessageRecord>, TriageError> {
        self.inner
            .apply_reclassification(message_id, classification, audit_note)
            .await
    }
}
