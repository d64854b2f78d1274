// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `triage reclassify`: re-run classification on one stored message.

use colored::Colorize;

use triage_config::TriageConfig;
use triage_core::{PluginAdapter, TriageError};

use crate::wiring;

pub async fn run_reclassify(config: &TriageConfig, message_id: &str) -> Result<(), TriageError> {
    let classifier = wiring::build_classifier(config)?;
    let storage = wiring::open_storage(config).await?;

    let result = triage_ingest::reclassify(storage.as_ref(), classifier.as_ref(), message_id).await;
    storage.shutdown().await?;
    let record = result?;

    println!(
        "{} {} -> {} ({:.2}): {}",
        "✓".green(),
        record.message_id,
        record.category.as_str().bold(),
        record.confidence.value(),
        record.explanation
    );
    Ok(())
}
