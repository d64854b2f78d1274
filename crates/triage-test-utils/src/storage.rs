// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Throwaway SQLite stores.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use triage_config::StorageConfig;
use triage_core::traits::StorageAdapter;
use triage_storage::SqliteStorage;

/// An initialized store whose file lives as long as this value.
pub struct TempStorage {
    pub storage: Arc<SqliteStorage>,
    pub path: PathBuf,
    _dir: TempDir,
}

impl TempStorage {
    pub fn config(&self) -> StorageConfig {
        StorageConfig {
            database_path: self.path.to_string_lossy().into_owned(),
            wal_mode: true,
        }
    }
}

/// Creates and initializes a SQLite store in a fresh temp directory.
///
/// # Panics
/// If the directory or database cannot be created.
pub async fn temp_storage() -> TempStorage {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("triage.db");
    let storage = Arc::new(SqliteStorage::new(StorageConfig {
        database_path: path.to_string_lossy().into_owned(),
        wal_mode: true,
    }));
    storage.initialize().await.expect("initialize temp storage");
    TempStorage {
        storage,
        path,
        _dir: dir,
    }
}
