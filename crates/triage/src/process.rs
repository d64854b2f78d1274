// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `triage process`: batch ingestion from a CSV file.

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;

use triage_config::{IngestConfig, TriageConfig};
use triage_core::{MessageClassifier, PluginAdapter, StorageAdapter, TriageError};
use triage_ingest::{BatchPipeline, BatchReport};

use crate::wiring;

/// Runs the pipeline over `csv` and prints a summary.
///
/// Returns exit code 1 when the run aborted.
pub async fn run_process(config: &TriageConfig, csv: &Path) -> Result<i32, TriageError> {
    let classifier = wiring::build_classifier(config)?;
    let storage = wiring::open_storage(config).await?;

    let report = process_file(storage.clone(), classifier, &config.ingest, csv).await;
    storage.shutdown().await?;

    print!("{}", render_summary(&report));
    Ok(if report.is_aborted() { 1 } else { 0 })
}

pub async fn process_file(
    storage: Arc<dyn StorageAdapter>,
    classifier: Arc<dyn MessageClassifier>,
    ingest: &IngestConfig,
    csv: &Path,
) -> BatchReport {
    BatchPipeline::new(classifier, storage, ingest.clone())
        .with_progress(|committed| println!("Processed {committed} messages..."))
        .run_csv(csv)
        .await
}

fn render_summary(report: &BatchReport) -> String {
    let mut out = String::new();
    for skipped in &report.row_errors {
        out.push_str(&format!("{} skipped {skipped}\n", "!".yellow()));
    }
    match &report.abort {
        Some(abort) => {
            out.push_str(&format!(
                "{} Aborted after committing {} messages: {abort}\n",
                "✗".red(),
                report.committed
            ));
        }
        None => {
            out.push_str(&format!(
                "{} Successfully processed {} messages",
                "✓".green(),
                report.committed
            ));
            if report.fallbacks > 0 {
                out.push_str(&format!(" ({} with fallback classification)", report.fallbacks));
            }
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use triage_test_utils::{MockClassifier, temp_storage};

    fn plain() {
        colored::control::set_override(false);
    }

    #[tokio::test]
    async fn processes_csv_into_storage() {
        plain();
        let temp = temp_storage().await;
        let mut csv = tempfile::NamedTempFile::new().unwrap();
        csv.write_all(
            b"message_id,subject,message,datetime\n\
              m1,Refill,Need refill,2024-01-01T10:00:00\n",
        )
        .unwrap();

        let report = process_file(
            temp.storage.clone(),
            Arc::new(MockClassifier::always_low()),
            &IngestConfig::default(),
            csv.path(),
        )
        .await;

        assert!(!report.is_aborted());
        assert_eq!(report.committed, 1);
        assert_eq!(
            render_summary(&report),
            "✓ Successfully processed 1 messages\n"
        );
    }

    #[tokio::test]
    async fn missing_file_renders_abort() {
        plain();
        let temp = temp_storage().await;
        let report = process_file(
            temp.storage.clone(),
            Arc::new(MockClassifier::always_low()),
            &IngestConfig::default(),
            Path::new("/definitely/not/here.csv"),
        )
        .await;

        assert!(report.is_aborted());
        let summary = render_summary(&report);
        assert!(summary.starts_with("✗ Aborted after committing 0 messages: source"));
    }
}
