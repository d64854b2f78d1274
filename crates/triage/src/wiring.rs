// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the concrete adapters from configuration.

use std::sync::Arc;

use triage_classifier::LlmClassifier;
use triage_config::TriageConfig;
use triage_core::{MessageClassifier, StorageAdapter, TriageError};
use triage_openai::OpenAiProvider;
use triage_storage::SqliteStorage;

/// Opens and migrates the configured SQLite store.
pub async fn open_storage(config: &TriageConfig) -> Result<Arc<SqliteStorage>, TriageError> {
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    Ok(storage)
}

/// OpenAI-backed classifier. Fails when no API key is configured.
pub fn build_classifier(config: &TriageConfig) -> Result<Arc<dyn MessageClassifier>, TriageError> {
    let provider = OpenAiProvider::new(&config.classifier)?;
    Ok(Arc::new(LlmClassifier::new(Arc::new(provider))))
}
