// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements run on tokio-rusqlite's single background thread, so the
//! [`Database`] handle is the only writer. Do not open extra connections for
//! writes.

use std::path::Path;

use tracing::{debug, info};
use triage_core::TriageError;

/// Handle to the SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path` in WAL mode and
    /// applies pending migrations.
    pub async fn open(path: &str) -> Result<Self, TriageError> {
        Self::open_with(path, true).await
    }

    /// Like [`Database::open`], with the journal mode chosen by `wal_mode`.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, TriageError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(TriageError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| TriageError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                // journal_mode returns a row, so it cannot go through execute_batch.
                let mode: String =
                    conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
                debug!(journal_mode = %mode, "journal mode set");
            }
            conn.execute_batch(
                "PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        let migrated = conn
            .call(|conn| -> Result<Result<(), TriageError>, rusqlite::Error> {
                Ok(crate::migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?;
        migrated?;

        info!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoints the WAL and closes the connection.
    pub async fn close(self) -> Result<(), TriageError> {
        checkpoint(&self.conn).await?;
        self.conn.close().await.map_err(|e| TriageError::Storage {
            source: Box::new(e),
        })?;
        debug!("database closed");
        Ok(())
    }
}

/// Folds the WAL back into the main database file.
pub async fn checkpoint(conn: &tokio_rusqlite::Connection) -> Result<(), TriageError> {
    conn.call(|conn| -> Result<(), rusqlite::Error> {
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    })
    .await
    .map_err(map_tr_err)
}

/// Maps a tokio-rusqlite error to a storage error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> TriageError {
    TriageError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested/dir/triage.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        assert!(db_path.exists());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_enables_wal() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("wal.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let mode = db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("PRAGMA journal_mode;", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn migrations_create_messages_table() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("schema.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let count = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'messages'",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");
        let path = db_path.to_str().unwrap();
        Database::open(path).await.unwrap().close().await.unwrap();
        Database::open(path).await.unwrap().close().await.unwrap();
    }
}
