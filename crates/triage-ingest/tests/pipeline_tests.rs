// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end batch runs against a real SQLite store.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use triage_classifier::LlmClassifier;
use triage_config::{FailurePolicy, IngestConfig};
use triage_core::{RecordFilter, StorageAdapter, TriageCategory, TriageError};
use triage_ingest::{BatchPipeline, BatchState, IngestErrorKind, RawRow};
use triage_test_utils::{FaultyStorage, MockClassifier, MockProvider, classified, temp_storage};

fn numbered_rows(n: usize) -> Vec<Result<RawRow, TriageError>> {
    (1..=n)
        .map(|i| {
            Ok(RawRow::new(
                i,
                &format!("m{i}"),
                &format!("subject {i}"),
                "body",
                &format!("2024-01-{:02}T08:00:00", (i % 28) + 1),
            ))
        })
        .collect()
}

fn ingest(failure_policy: FailurePolicy) -> IngestConfig {
    IngestConfig {
        checkpoint_size: 10,
        failure_policy,
        run_timeout_secs: None,
    }
}

fn write_csv(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn commit_failure_keeps_earlier_checkpoints() {
    let temp = temp_storage().await;
    let faulty = Arc::new(FaultyStorage::new(temp.storage.clone()).fail_commit_containing("m22"));
    let pipeline = BatchPipeline::new(
        Arc::new(MockClassifier::always_low()),
        faulty.clone(),
        ingest(FailurePolicy::FailFast),
    );

    let report = pipeline.run(numbered_rows(25)).await;

    assert_eq!(report.state, BatchState::Aborted);
    assert_eq!(report.committed, 20);
    assert_eq!(report.rows_seen, 25);
    assert_eq!(report.abort.as_ref().unwrap().kind, IngestErrorKind::StorageCommit);
    assert_eq!(faulty.commit_attempts(), 3);

    let stored = temp.storage.list(&RecordFilter::default()).await.unwrap();
    assert_eq!(stored.len(), 20);
    assert!(temp.storage.get("m20").await.unwrap().is_some());
    assert!(temp.storage.get("m21").await.unwrap().is_none());
}

#[tokio::test]
async fn stored_duplicate_is_rejected_without_overwrite() {
    let temp = temp_storage().await;
    let first = BatchPipeline::new(
        Arc::new(MockClassifier::new(classified(TriageCategory::High, 0.9, "first pass"))),
        temp.storage.clone(),
        ingest(FailurePolicy::FailFast),
    );
    assert_eq!(first.run(numbered_rows(1)).await.committed, 1);

    let classifier = Arc::new(MockClassifier::always_low());
    let second = BatchPipeline::new(
        classifier.clone(),
        temp.storage.clone(),
        ingest(FailurePolicy::FailFast),
    );
    let report = second.run(numbered_rows(1)).await;

    assert!(report.is_aborted());
    let abort = report.abort.unwrap();
    assert_eq!(abort.kind, IngestErrorKind::UniqueConstraint);
    assert_eq!(abort.message_id.as_deref(), Some("m1"));
    assert!(classifier.calls().is_empty());

    let kept = temp.storage.get("m1").await.unwrap().unwrap();
    assert_eq!(kept.category, TriageCategory::High);
    assert_eq!(kept.explanation, "first pass");
}

async fn store_m2_first(temp: &triage_test_utils::TempStorage) {
    let seed = BatchPipeline::new(
        Arc::new(MockClassifier::new(classified(TriageCategory::High, 0.9, "first pass"))),
        temp.storage.clone(),
        ingest(FailurePolicy::FailFast),
    );
    let rows = vec![Ok(RawRow::new(1, "m2", "subject 2", "body", "2024-01-03T08:00:00"))];
    assert_eq!(seed.run(rows).await.committed, 1);
}

#[tokio::test]
async fn commit_time_duplicate_is_dropped_and_retried_under_collect() {
    let temp = temp_storage().await;
    store_m2_first(&temp).await;
    let blind = Arc::new(FaultyStorage::new(temp.storage.clone()).blind_contains());
    let pipeline = BatchPipeline::new(
        Arc::new(MockClassifier::always_low()),
        blind.clone(),
        ingest(FailurePolicy::Collect),
    );

    let report = pipeline.run(numbered_rows(3)).await;

    assert_eq!(report.state, BatchState::Completed);
    assert_eq!(report.committed, 2);
    assert_eq!(report.row_errors.len(), 1);
    let skipped = &report.row_errors[0];
    assert_eq!(skipped.kind, IngestErrorKind::UniqueConstraint);
    assert_eq!(skipped.row, Some(2));
    assert_eq!(skipped.message_id.as_deref(), Some("m2"));
    assert_eq!(blind.commit_attempts(), 2);

    assert!(temp.storage.get("m1").await.unwrap().is_some());
    assert!(temp.storage.get("m3").await.unwrap().is_some());
    let kept = temp.storage.get("m2").await.unwrap().unwrap();
    assert_eq!(kept.explanation, "first pass");
}

#[tokio::test]
async fn commit_time_duplicate_aborts_under_fail_fast() {
    let temp = temp_storage().await;
    store_m2_first(&temp).await;
    let pipeline = BatchPipeline::new(
        Arc::new(MockClassifier::always_low()),
        Arc::new(FaultyStorage::new(temp.storage.clone()).blind_contains()),
        ingest(FailurePolicy::FailFast),
    );

    let report = pipeline.run(numbered_rows(3)).await;

    assert_eq!(report.state, BatchState::Aborted);
    assert_eq!(report.committed, 0);
    let abort = report.abort.unwrap();
    assert_eq!(abort.kind, IngestErrorKind::UniqueConstraint);
    assert_eq!(abort.message_id.as_deref(), Some("m2"));
    assert!(temp.storage.get("m1").await.unwrap().is_none());
    assert_eq!(temp.storage.list(&RecordFilter::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn critical_reply_is_persisted() {
    let temp = temp_storage().await;
    let provider = MockProvider::with_replies([
        r#"{"category": "CRITICAL", "confidence": 0.95, "explanation": "possible cardiac event"}"#,
    ]);
    let pipeline = BatchPipeline::new(
        Arc::new(LlmClassifier::new(Arc::new(provider))),
        temp.storage.clone(),
        IngestConfig::default(),
    );
    let rows = vec![Ok(RawRow::new(
        1,
        "m1",
        "Chest pain",
        "Chest pain now",
        "2024-01-01T10:00:00",
    ))];

    let report = pipeline.run(rows).await;

    assert_eq!(report.state, BatchState::Completed);
    assert_eq!(report.committed, 1);
    let record = temp.storage.get("m1").await.unwrap().unwrap();
    assert_eq!(record.category, TriageCategory::Critical);
    assert_eq!(record.confidence.value(), 0.95);
    assert_eq!(record.content, "Chest pain now");
    assert!(!record.is_read);
}

#[tokio::test]
async fn prose_reply_falls_back_to_medium() {
    let temp = temp_storage().await;
    let provider = MockProvider::with_replies(["I cannot classify this."]);
    let pipeline = BatchPipeline::new(
        Arc::new(LlmClassifier::new(Arc::new(provider))),
        temp.storage.clone(),
        IngestConfig::default(),
    );
    let rows = vec![Ok(RawRow::new(
        1,
        "m1",
        "Chest pain",
        "Chest pain now",
        "2024-01-01T10:00:00",
    ))];

    let report = pipeline.run(rows).await;

    assert_eq!(report.committed, 1);
    assert_eq!(report.fallbacks, 1);
    let record = temp.storage.get("m1").await.unwrap().unwrap();
    assert_eq!(record.category, TriageCategory::Medium);
    assert_eq!(record.confidence.value(), 0.5);
    assert_eq!(record.explanation, "Error parsing classification response");
}

#[tokio::test]
async fn collect_policy_skips_bad_rows() {
    let temp = temp_storage().await;
    let mut rows = numbered_rows(4);
    rows.insert(1, Ok(RawRow::new(0, "bad-ts", "s", "c", "yesterday")));
    rows.push(Ok(RawRow::new(0, "m3", "again", "c", "2024-02-01")));
    let pipeline = BatchPipeline::new(
        Arc::new(MockClassifier::always_low()),
        temp.storage.clone(),
        ingest(FailurePolicy::Collect),
    );

    let report = pipeline.run(rows).await;

    assert_eq!(report.state, BatchState::Completed);
    assert_eq!(report.committed, 4);
    assert_eq!(report.rows_seen, 6);
    let kinds: Vec<_> = report.row_errors.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        [IngestErrorKind::RowValidation, IngestErrorKind::UniqueConstraint]
    );
    assert_eq!(report.row_errors[0].row, Some(2));
    assert_eq!(report.row_errors[1].row, Some(6));
}

#[tokio::test]
async fn bad_timestamp_aborts_under_fail_fast() {
    let temp = temp_storage().await;
    let mut rows = numbered_rows(3);
    rows.push(Ok(RawRow::new(4, "m4", "s", "c", "2024-13-45")));
    let pipeline = BatchPipeline::new(
        Arc::new(MockClassifier::always_low()),
        temp.storage.clone(),
        ingest(FailurePolicy::FailFast),
    );

    let report = pipeline.run(rows).await;

    assert!(report.is_aborted());
    assert_eq!(report.committed, 0);
    let abort = report.abort.unwrap();
    assert_eq!(abort.kind, IngestErrorKind::RowValidation);
    assert_eq!(abort.row, Some(4));
    assert_eq!(temp.storage.stats().await.unwrap().total_messages, 0);
}

#[tokio::test(start_paused = true)]
async fn run_timeout_aborts_slow_classification() {
    let temp = temp_storage().await;
    let pipeline = BatchPipeline::new(
        Arc::new(MockClassifier::always_low().with_delay(Duration::from_secs(2))),
        temp.storage.clone(),
        IngestConfig {
            checkpoint_size: 1,
            failure_policy: FailurePolicy::FailFast,
            run_timeout_secs: Some(5),
        },
    );

    let report = pipeline.run(numbered_rows(5)).await;

    assert!(report.is_aborted());
    assert_eq!(report.abort.as_ref().unwrap().kind, IngestErrorKind::Timeout);
    assert_eq!(report.committed, 2);
}

#[tokio::test]
async fn csv_file_runs_end_to_end() {
    let temp = temp_storage().await;
    let file = write_csv(
        "message_id,subject,message,datetime,channel\n\
         m1,Chest pain,Chest pain now,2024-01-01T10:00:00,portal\n\
         m2,Refill,\"Need my refill, please\",2024-01-02T09:30:00,email\n",
    );
    let classifier = MockClassifier::always_low().with_outcome(
        "Chest pain",
        classified(TriageCategory::Critical, 0.95, "cardiac"),
    );
    let pipeline = BatchPipeline::new(
        Arc::new(classifier),
        temp.storage.clone(),
        IngestConfig::default(),
    );

    let report = pipeline.run_csv(file.path()).await;

    assert_eq!(report.state, BatchState::Completed);
    assert_eq!(report.committed, 2);
    let stats = temp.storage.stats().await.unwrap();
    assert_eq!(stats.categories.get(&TriageCategory::Critical), Some(&1));
    assert_eq!(stats.categories.get(&TriageCategory::Low), Some(&1));
    let refill = temp.storage.get("m2").await.unwrap().unwrap();
    assert_eq!(refill.content, "Need my refill, please");
}

#[tokio::test]
async fn csv_missing_column_aborts_before_any_row() {
    let temp = temp_storage().await;
    let file = write_csv("message_id,subject,message\nm1,s,c\n");
    let pipeline = BatchPipeline::new(
        Arc::new(MockClassifier::always_low()),
        temp.storage.clone(),
        IngestConfig::default(),
    );

    let report = pipeline.run_csv(file.path()).await;

    assert!(report.is_aborted());
    assert_eq!(report.rows_seen, 0);
    assert_eq!(report.abort.unwrap().kind, IngestErrorKind::Source);
}

#[tokio::test]
async fn rerun_after_abort_only_adds_missing_rows() {
    let temp = temp_storage().await;
    let faulty = Arc::new(FaultyStorage::new(temp.storage.clone()).fail_commit_containing("m12"));
    let broken = BatchPipeline::new(
        Arc::new(MockClassifier::always_low()),
        faulty,
        ingest(FailurePolicy::FailFast),
    );
    assert_eq!(broken.run(numbered_rows(15)).await.committed, 10);

    let retry = BatchPipeline::new(
        Arc::new(MockClassifier::always_low()),
        temp.storage.clone(),
        ingest(FailurePolicy::Collect),
    );
    let report = retry.run(numbered_rows(15)).await;

    assert_eq!(report.state, BatchState::Completed);
    assert_eq!(report.committed, 5);
    assert_eq!(report.row_errors.len(), 10);
    assert_eq!(temp.storage.stats().await.unwrap().total_messages, 15);
}
