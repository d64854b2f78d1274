// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch sources and per-row validation.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;
use triage_core::TriageError;
use triage_core::timestamp::parse_iso8601;

/// Columns every batch must carry. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 4] = ["message_id", "subject", "message", "datetime"];

/// One candidate row as read from the source. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawRow {
    /// 1-based position among data rows.
    #[serde(skip)]
    pub row: usize,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub datetime: Option<String>,
}

/// A row that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRow {
    pub row: usize,
    pub message_id: String,
    pub subject: String,
    pub content: String,
    pub occurred_at: NaiveDateTime,
}

impl RawRow {
    /// Convenience constructor for in-memory batches.
    pub fn new(row: usize, message_id: &str, subject: &str, message: &str, datetime: &str) -> Self {
        Self {
            row,
            message_id: Some(message_id.to_string()),
            subject: Some(subject.to_string()),
            message: Some(message.to_string()),
            datetime: Some(datetime.to_string()),
        }
    }

    /// Checks that all four fields are present and `datetime` is ISO-8601.
    pub fn validate(self) -> Result<ValidRow, TriageError> {
        let row = self.row;
        let missing = |field: &str| TriageError::RowValidation {
            row,
            reason: format!("missing field `{field}`"),
        };

        let message_id = present(self.message_id).ok_or_else(|| missing("message_id"))?;
        let subject = present(self.subject).ok_or_else(|| missing("subject"))?;
        let content = present(self.message).ok_or_else(|| missing("message"))?;
        let datetime = present(self.datetime).ok_or_else(|| missing("datetime"))?;
        let occurred_at = parse_iso8601(&datetime).ok_or_else(|| TriageError::RowValidation {
            row,
            reason: format!("`datetime` value `{datetime}` is not an ISO-8601 timestamp"),
        })?;

        Ok(ValidRow {
            row,
            message_id: message_id.trim().to_string(),
            subject,
            content,
            occurred_at,
        })
    }
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

/// CSV batch source with a header row.
///
/// The file is read fully on open; iteration does no I/O.
pub struct CsvSource {
    reader: csv::Reader<Box<dyn Read + Send>>,
    headers: csv::StringRecord,
    next_row: usize,
}

impl std::fmt::Debug for CsvSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvSource")
            .field("headers", &self.headers)
            .field("next_row", &self.next_row)
            .finish()
    }
}

impl CsvSource {
    /// Opens a CSV file. Fails with [`TriageError::Source`] if the file cannot
    /// be read or lacks a required column.
    pub async fn open(path: &Path) -> Result<Self, TriageError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| TriageError::Source {
            message: format!("cannot read `{}`: {e}", path.display()),
            source: Some(Box::new(e)),
        })?;
        Self::from_reader(std::io::Cursor::new(bytes))
    }

    pub fn from_reader(reader: impl Read + Send + 'static) -> Result<Self, TriageError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::Headers)
            .from_reader(Box::new(reader) as Box<dyn Read + Send>);

        let headers = reader
            .headers()
            .map_err(|e| TriageError::Source {
                message: format!("cannot read CSV header: {e}"),
                source: Some(Box::new(e)),
            })?
            .clone();

        let absent: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .collect();
        if !absent.is_empty() {
            return Err(TriageError::Source {
                message: format!("CSV header is missing column(s): {}", absent.join(", ")),
                source: None,
            });
        }

        Ok(Self {
            reader,
            headers,
            next_row: 1,
        })
    }
}

impl Iterator for CsvSource {
    type Item = Result<RawRow, TriageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = csv::StringRecord::new();
        let row = self.next_row;
        match self.reader.read_record(&mut record) {
            Ok(false) => None,
            Ok(true) => {
                self.next_row += 1;
                Some(
                    record
                        .deserialize::<RawRow>(Some(&self.headers))
                        .map(|raw| RawRow { row, ..raw })
                        .map_err(|e| TriageError::RowValidation {
                            row,
                            reason: format!("malformed CSV record: {e}"),
                        }),
                )
            }
            Err(e) if e.is_io_error() => Some(Err(TriageError::Source {
                message: format!("read failed at row {row}: {e}"),
                source: Some(Box::new(e)),
            })),
            Err(e) => {
                self.next_row += 1;
                Some(Err(TriageError::RowValidation {
                    row,
                    reason: format!("malformed CSV record: {e}"),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &'static str) -> CsvSource {
        CsvSource::from_reader(text.as_bytes()).unwrap()
    }

    #[test]
    fn reads_rows_with_positions() {
        let rows: Vec<_> = source(
            "message_id,subject,message,datetime\n\
             m1,Chest pain,Chest pain now,2024-01-01T10:00:00\n\
             m2,Refill,Need refill,2024-01-02T09:30:00\n",
        )
        .collect::<Result<_, _>>()
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], RawRow::new(1, "m1", "Chest pain", "Chest pain now", "2024-01-01T10:00:00"));
        assert_eq!(rows[1].row, 2);
    }

    #[test]
    fn extra_columns_and_order_are_ignored() {
        let rows: Vec<_> = source(
            "datetime,priority,message_id,message,subject\n\
             2024-01-01,high,m1,body,subj\n",
        )
        .collect::<Result<_, _>>()
        .unwrap();
        assert_eq!(rows[0].message_id.as_deref(), Some("m1"));
        assert_eq!(rows[0].subject.as_deref(), Some("subj"));
    }

    #[test]
    fn missing_column_is_source_error() {
        let err = CsvSource::from_reader("message_id,subject,message\nm1,s,c\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, TriageError::Source { .. }));
        assert!(err.to_string().contains("datetime"));
    }

    #[test]
    fn ragged_record_is_row_validation() {
        let mut src = source(
            "message_id,subject,message,datetime\n\
             m1,s,c\n\
             m2,s,c,2024-01-01\n",
        );
        assert!(matches!(
            src.next(),
            Some(Err(TriageError::RowValidation { row: 1, .. }))
        ));
        let next = src.next().unwrap().unwrap();
        assert_eq!(next.row, 2);
        assert!(src.next().is_none());
    }

    #[test]
    fn quoted_fields_keep_commas_and_newlines() {
        let rows: Vec<_> = source(
            "message_id,subject,message,datetime\n\
             m1,\"Pain, chest\",\"line one\nline two\",2024-01-01T10:00:00\n",
        )
        .collect::<Result<_, _>>()
        .unwrap();
        assert_eq!(rows[0].subject.as_deref(), Some("Pain, chest"));
        assert_eq!(rows[0].message.as_deref(), Some("line one\nline two"));
    }

    #[test]
    fn validate_accepts_complete_row() {
        let valid = RawRow::new(3, " m1 ", "s", "c", "2024-01-01T10:00:00")
            .validate()
            .unwrap();
        assert_eq!(valid.row, 3);
        assert_eq!(valid.message_id, "m1");
        assert_eq!(valid.occurred_at.to_string(), "2024-01-01 10:00:00");
    }

    #[test]
    fn validate_rejects_blank_field() {
        let mut raw = RawRow::new(4, "m1", "s", "c", "2024-01-01");
        raw.subject = Some("   ".into());
        let err = raw.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid row 4: missing field `subject`");
    }

    #[test]
    fn validate_rejects_bad_timestamp() {
        let err = RawRow::new(5, "m1", "s", "c", "last tuesday")
            .validate()
            .unwrap_err();
        assert!(matches!(err, TriageError::RowValidation { row: 5, .. }));
        assert!(err.to_string().contains("ISO-8601"));
    }

    #[tokio::test]
    async fn open_missing_file_is_source_error() {
        let err = CsvSource::open(Path::new("/definitely/not/here.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::Source { .. }));
    }
}
