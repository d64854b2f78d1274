// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message record CRUD operations.

use std::collections::BTreeMap;

use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};
use triage_core::timestamp::{
    format_occurred_at, format_processed_at, parse_occurred_at, parse_processed_at,
};
use triage_core::types::{
    CategoryStats, Classification, Confidence, MessageRecord, RecordFilter, RecordPatch,
};
use triage_core::{TriageCategory, TriageError};

use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "message_id, subject, content, occurred_at, category, confidence, \
                       explanation, processed_at, is_read, notes";

/// Returns true if a record with `message_id` exists.
pub async fn contains(db: &Database, message_id: &str) -> Result<bool, TriageError> {
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM messages WHERE message_id = ?1)",
                params![message_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Inserts `records` in one transaction.
///
/// A duplicate `message_id` rolls the transaction back and reports
/// [`TriageError::UniqueConstraint`]; any other failure reports
/// [`TriageError::StorageCommit`]. Nothing from the group is left behind
/// in either case.
pub async fn insert_group(db: &Database, records: &[MessageRecord]) -> Result<(), TriageError> {
    if records.is_empty() {
        return Ok(());
    }
    let records = records.to_vec();
    let outcome = db
        .connection()
        .call(move |conn| -> Result<Result<(), String>, rusqlite::Error> {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO messages (message_id, subject, content, occurred_at, category,
                                           confidence, explanation, processed_at, is_read, notes)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                )?;
                for record in &records {
                    let inserted = stmt.execute(params![
                        record.message_id,
                        record.subject,
                        record.content,
                        format_occurred_at(&record.occurred_at),
                        record.category.as_str(),
                        record.confidence.value(),
                        record.explanation,
                        format_processed_at(&record.processed_at),
                        record.is_read,
                        record.notes,
                    ]);
                    match inserted {
                        Ok(_) => {}
                        // Dropping `tx` rolls back.
                        Err(e) if is_unique_violation(&e) => {
                            return Ok(Err(record.message_id.clone()));
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
            tx.commit()?;
            Ok(Ok(()))
        })
        .await
        .map_err(|e| TriageError::StorageCommit {
            source: Box::new(e),
        })?;

    outcome.map_err(|message_id| TriageError::UniqueConstraint { message_id })
}

/// Fetches one record.
pub async fn get(db: &Database, message_id: &str) -> Result<Option<MessageRecord>, TriageError> {
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<MessageRecord>, rusqlite::Error> {
            select_one(conn, &message_id)
        })
        .await
        .map_err(map_tr_err)
}

/// Lists records matching `filter`, ordered by `occurred_at` then `message_id`.
pub async fn list(db: &Database, filter: &RecordFilter) -> Result<Vec<MessageRecord>, TriageError> {
    let category = filter.category.map(|c| c.as_str());
    let start = filter.start.as_ref().map(format_occurred_at);
    let end = filter.end.as_ref().map(format_occurred_at);
    db.connection()
        .call(move |conn| -> Result<Vec<MessageRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages
                 WHERE (?1 IS NULL OR category = ?1)
                   AND (?2 IS NULL OR occurred_at >= ?2)
                   AND (?3 IS NULL OR occurred_at <= ?3)
                 ORDER BY occurred_at ASC, message_id ASC"
            ))?;
            let records = stmt
                .query_map(params![category, start, end], row_to_record)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
        .await
        .map_err(map_tr_err)
}

/// Applies a partial update and returns the updated record, or `None` if
/// no record matches.
pub async fn update(
    db: &Database,
    message_id: &str,
    patch: &RecordPatch,
) -> Result<Option<MessageRecord>, TriageError> {
    let message_id = message_id.to_string();
    let patch = patch.clone();
    db.connection()
        .call(move |conn| -> Result<Option<MessageRecord>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE messages
                 SET category = COALESCE(?2, category),
                     notes    = COALESCE(?3, notes),
                     is_read  = COALESCE(?4, is_read)
                 WHERE message_id = ?1",
                params![
                    message_id,
                    patch.category.map(|c| c.as_str()),
                    patch.notes,
                    patch.is_read,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            let record = select_one(&tx, &message_id)?;
            tx.commit()?;
            Ok(record)
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrites the classification triple of one record and appends
/// `audit_note` to its notes in the same statement.
pub async fn reclassify(
    db: &Database,
    message_id: &str,
    classification: &Classification,
    audit_note: &str,
) -> Result<Option<MessageRecord>, TriageError> {
    let message_id = message_id.to_string();
    let classification = classification.clone();
    let audit_note = audit_note.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<MessageRecord>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE messages
                 SET category = ?2, confidence = ?3, explanation = ?4,
                     notes = CASE
                         WHEN notes IS NULL OR notes = '' THEN ?5
                         ELSE notes || char(10) || ?5
                     END
                 WHERE message_id = ?1",
                params![
                    message_id,
                    classification.category.as_str(),
                    classification.confidence.value(),
                    classification.explanation,
                    audit_note,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            let record = select_one(&tx, &message_id)?;
            tx.commit()?;
            Ok(record)
        })
        .await
        .map_err(map_tr_err)
}

/// Total record count and per-category counts.
pub async fn stats(db: &Database) -> Result<CategoryStats, TriageError> {
    db.connection()
        .call(|conn| -> Result<CategoryStats, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT category, COUNT(*) FROM messages GROUP BY category ORDER BY category",
            )?;
            let mut categories = BTreeMap::new();
            let mut total_messages = 0u64;
            let rows = stmt.query_map([], |row| {
                let category = parse_category(row, 0)?;
                let count: i64 = row.get(1)?;
                Ok((category, count as u64))
            })?;
            for row in rows {
                let (category, count) = row?;
                total_messages += count;
                categories.insert(category, count);
            }
            Ok(CategoryStats {
                total_messages,
                categories,
            })
        })
        .await
        .map_err(map_tr_err)
}

fn select_one(
    conn: &rusqlite::Connection,
    message_id: &str,
) -> Result<Option<MessageRecord>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM messages WHERE message_id = ?1"),
        params![message_id],
        row_to_record,
    )
    .optional()
}

fn row_to_record(row: &Row<'_>) -> Result<MessageRecord, rusqlite::Error> {
    let occurred_at: String = row.get(3)?;
    let confidence: f64 = row.get(5)?;
    let processed_at: String = row.get(7)?;

    Ok(MessageRecord {
        message_id: row.get(0)?,
        subject: row.get(1)?,
        content: row.get(2)?,
        occurred_at: parse_occurred_at(&occurred_at)
            .ok_or_else(|| conversion_error(3, format!("bad occurred_at `{occurred_at}`")))?,
        category: parse_category(row, 4)?,
        confidence: Confidence::new(confidence)
            .ok_or_else(|| conversion_error(5, format!("confidence {confidence} out of range")))?,
        explanation: row.get(6)?,
        processed_at: parse_processed_at(&processed_at)
            .ok_or_else(|| conversion_error(7, format!("bad processed_at `{processed_at}`")))?,
        is_read: row.get(8)?,
        notes: row.get(9)?,
    })
}

fn parse_category(row: &Row<'_>, idx: usize) -> Result<TriageCategory, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|_| conversion_error(idx, format!("unknown category `{raw}`")))
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

/// True for UNIQUE and PRIMARY KEY constraint failures.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}
