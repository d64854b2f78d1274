// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classifier trait consumed by the ingestion pipeline.

use async_trait::async_trait;

use crate::types::ClassificationOutcome;

/// Turns a message into a validated classification outcome.
///
/// Infallible by contract: transport and validation failures come back as
/// [`ClassificationOutcome::Fallback`].
#[async_trait]
pub trait MessageClassifier: Send + Sync {
    async fn classify(&self, subject: &str, content: &str) -> ClassificationOutcome;
}
