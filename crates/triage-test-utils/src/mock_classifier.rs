// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted classifier for pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use triage_core::traits::MessageClassifier;
use triage_core::types::{Classification, ClassificationOutcome, Confidence, FallbackReason};
use triage_core::TriageCategory;

/// Returns a per-subject outcome, or the default outcome for unknown subjects.
pub struct MockClassifier {
    default: ClassificationOutcome,
    by_subject: HashMap<String, ClassificationOutcome>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockClassifier {
    pub fn new(default: ClassificationOutcome) -> Self {
        Self {
            default,
            by_subject: HashMap::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Classifies everything as LOW with confidence 0.8.
    pub fn always_low() -> Self {
        Self::new(classified(TriageCategory::Low, 0.8, "routine"))
    }

    pub fn with_outcome(mut self, subject: &str, outcome: ClassificationOutcome) -> Self {
        self.by_subject.insert(subject.to_string(), outcome);
        self
    }

    /// Sleeps before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Subjects classified so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

/// Shorthand for a successful outcome.
///
/// # Panics
/// If `confidence` is outside `[0, 1]`.
pub fn classified(category: TriageCategory, confidence: f64, explanation: &str) -> ClassificationOutcome {
    ClassificationOutcome::Classified(Classification {
        category,
        confidence: Confidence::new(confidence).expect("confidence in range"),
        explanation: explanation.to_string(),
    })
}

/// Shorthand for a fallback outcome.
pub fn fallback(reason: FallbackReason) -> ClassificationOutcome {
    ClassificationOutcome::Fallback(reason)
}

#[async_trait]
impl MessageClassifier for MockClassifier {
    async fn classify(&self, subject: &str, _content: &str) -> ClassificationOutcome {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(subject.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.by_subject
            .get(subject)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn per_subject_outcome_overrides_default() {
        let classifier = MockClassifier::always_low().with_outcome(
            "Chest pain",
            classified(TriageCategory::Critical, 0.95, "cardiac"),
        );
        let critical = classifier.classify("Chest pain", "x").await;
        let low = classifier.classify("Refill", "y").await;
        assert_eq!(critical.classification().category, TriageCategory::Critical);
        assert_eq!(low.classification().category, TriageCategory::Low);
        assert_eq!(classifier.calls(), ["Chest pain", "Refill"]);
    }
}
