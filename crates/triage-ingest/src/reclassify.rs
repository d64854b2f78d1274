// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Re-running classification on a stored record.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use triage_core::timestamp::{format_processed_at, now_for_storage};
use triage_core::{MessageClassifier, MessageRecord, StorageAdapter, TriageCategory, TriageError};

/// Classifies a stored record again and overwrites its category, confidence
/// and explanation. The previous category is appended to `notes`.
///
/// Fails with [`TriageError::NotFound`] when no record has `message_id`.
pub async fn reclassify(
    storage: &dyn StorageAdapter,
    classifier: &dyn MessageClassifier,
    message_id: &str,
) -> Result<MessageRecord, TriageError> {
    let not_found = || TriageError::NotFound {
        message_id: message_id.to_string(),
    };
    let current = storage.get(message_id).await?.ok_or_else(not_found)?;

    let outcome = classifier.classify(&current.subject, &current.content).await;
    if let Some(reason) = outcome.fallback_reason() {
        warn!(message_id, reason = reason.kind(), "reclassification fell back to default");
    }
    let classification = outcome.classification();

    let audit = audit_line(current.category, classification.category, now_for_storage());
    let updated = storage
        .apply_reclassification(message_id, &classification, &audit)
        .await?
        .ok_or_else(not_found)?;
    info!(
        message_id,
        from = %current.category,
        to = %updated.category,
        confidence = updated.confidence.value(),
        "record reclassified"
    );
    Ok(updated)
}

fn audit_line(previous: TriageCategory, next: TriageCategory, at: DateTime<Utc>) -> String {
    format!(
        "[{}] reclassified from {previous} to {next}",
        format_processed_at(&at)
    )
}
