// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification client adapter.
//!
//! Wraps one call to a [`ProviderAdapter`] per message: builds the triage
//! prompt, validates the reply, and degrades every failure to the MEDIUM/0.5
//! fallback. [`LlmClassifier::classify`] never returns an error.

pub mod parse;
pub mod prompt;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use triage_core::traits::{MessageClassifier, ProviderAdapter};
use triage_core::types::{ClassificationOutcome, FallbackReason};

pub use parse::{parse_reply, strip_code_fence};
pub use prompt::{SYSTEM_INSTRUCTION, build_prompt};

/// Classifier backed by a language-model provider.
pub struct LlmClassifier {
    provider: Arc<dyn ProviderAdapter>,
}

impl LlmClassifier {
    pub fn new(provider: Arc<dyn ProviderAdapter>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl MessageClassifier for LlmClassifier {
    async fn classify(&self, subject: &str, content: &str) -> ClassificationOutcome {
        let request = prompt::build_request(subject, content);
        debug!(provider = self.provider.name(), "sending classification request");

        match self.provider.complete(request).await {
            Ok(response) => {
                debug!(id = %response.id, model = %response.model, "classification reply received");
                parse::parse_reply(&response.content)
            }
            Err(e) => {
                let reason = FallbackReason::Transport(e.to_string());
                warn!(kind = reason.kind(), error = %e, "classification call failed, using fallback");
                ClassificationOutcome::Fallback(reason)
            }
        }
    }
}
