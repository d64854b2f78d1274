// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations.
//!
//! SQL files under `migrations/` are compiled in with `embed_migrations!` and
//! applied every time the database is opened.

use tracing::debug;
use triage_core::TriageError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Applies pending migrations. Refinery records applied versions in
/// `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), TriageError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| TriageError::Storage {
            source: Box::new(e),
        })?;
    for migration in report.applied_migrations() {
        debug!(version = migration.version(), name = migration.name(), "migration applied");
    }
    Ok(())
}
