// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use triage_config::StorageConfig;
use triage_core::types::{
    CategoryStats, Classification, MessageRecord, RecordFilter, RecordPatch,
};
use triage_core::{AdapterType, HealthStatus, PluginAdapter, StorageAdapter, TriageError};

use crate::database::{self, Database, map_tr_err};
use crate::queries;

/// SQLite-backed message store.
///
/// The database is opened by [`StorageAdapter::initialize`]; every other
/// operation fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, TriageError> {
        self.db.get().ok_or_else(|| TriageError::Storage {
            source: "storage not initialized, call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TriageError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TriageError> {
        if self.db.initialized() {
            self.close().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), TriageError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| TriageError::Storage {
            source: "storage already initialized".into(),
        })?;
        info!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), TriageError> {
        database::checkpoint(self.db()?.connection()).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn contains(&self, message_id: &str) -> Result<bool, TriageError> {
        queries::messages::contains(self.db()?, message_id).await
    }

    async fn commit_group(&self, records: &[MessageRecord]) -> Result<(), TriageError> {
        queries::messages::insert_group(self.db()?, records).await
    }

    async fn get(&self, message_id: &str) -> Result<Option<MessageRecord>, TriageError> {
        queries::messages::get(self.db()?, message_id).await
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<MessageRecord>, TriageError> {
        queries::messages::list(self.db()?, filter).await
    }

    async fn update(
        &self,
        message_id: &str,
        patch: &RecordPatch,
    ) -> Result<Option<MessageRecord>, TriageError> {
        if patch.is_empty() {
            return self.get(message_id).await;
        }
        queries::messages::update(self.db()?, message_id, patch).await
    }

    async fn stats(&self) -> Result<CategoryStats, TriageError> {
        queries::messages::stats(self.db()?).await
    }

    async fn apply_reclassification(
        &self,
        message_id: &str,
        classification: &Classification,
        audit_note: &str,
    ) -> Result<Option<MessageRecord>, TriageError> {
        queries::messages::reclassify(self.db()?, message_id, classification, audit_note).await
    }
}
