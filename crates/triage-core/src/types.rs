// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the triage workspace.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
}

/// Triage urgency category, declared in descending order of urgency.
///
/// `Ord` follows declaration order, so `Critical < Reference`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TriageCategory {
    /// Requires attention within the hour.
    Critical,
    /// Requires attention within 24 hours.
    High,
    /// Requires attention within 2-3 days.
    Medium,
    /// Can be handled when convenient.
    Low,
    /// Informational, no action needed.
    Reference,
}

impl TriageCategory {
    /// All categories, most urgent first.
    pub const ALL: [TriageCategory; 5] = [
        TriageCategory::Critical,
        TriageCategory::High,
        TriageCategory::Medium,
        TriageCategory::Low,
        TriageCategory::Reference,
    ];

    /// Stable uppercase name used in prompts, storage and the HTTP API.
    pub fn as_str(&self) -> &'static str {
        match self {
            TriageCategory::Critical => "CRITICAL",
            TriageCategory::High => "HIGH",
            TriageCategory::Medium => "MEDIUM",
            TriageCategory::Low => "LOW",
            TriageCategory::Reference => "REFERENCE",
        }
    }
}

/// Classifier confidence, always within `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Substituted whenever the classifier's confidence is unusable.
    pub const DEFAULT: Confidence = Confidence(0.5);

    /// Returns `None` for values outside `[0.0, 1.0]` (including NaN).
    pub fn new(value: f64) -> Option<Self> {
        (0.0..=1.0).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Confidence {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Confidence::new(value).ok_or_else(|| format!("confidence {value} is outside [0, 1]"))
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> f64 {
        c.0
    }
}

/// A validated classification triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: TriageCategory,
    pub confidence: Confidence,
    pub explanation: String,
}

/// Why a classifier reply was replaced by the fallback triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The reply was not valid JSON.
    Unparseable,
    /// The reply parsed but lacked `category`, `confidence` or `explanation`.
    InvalidFormat,
    /// `category` was not one of the five triage categories.
    InvalidCategory,
    /// The provider call itself failed; carries the diagnostic text.
    Transport(String),
}

impl FallbackReason {
    /// Short machine-readable tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FallbackReason::Unparseable => "parse",
            FallbackReason::InvalidFormat | FallbackReason::InvalidCategory => "field",
            FallbackReason::Transport(_) => "transport",
        }
    }

    /// The explanation text persisted with the fallback record.
    pub fn explanation(&self) -> String {
        match self {
            FallbackReason::Unparseable => "Error parsing classification response".to_string(),
            FallbackReason::InvalidFormat => "Invalid classification response format".to_string(),
            FallbackReason::InvalidCategory => "Invalid classification category".to_string(),
            FallbackReason::Transport(diagnostic) => {
                format!("Error in classification: {diagnostic}")
            }
        }
    }

    /// The fallback triple: MEDIUM, 0.5, reason text.
    pub fn classification(&self) -> Classification {
        Classification {
            category: TriageCategory::Medium,
            confidence: Confidence::DEFAULT,
            explanation: self.explanation(),
        }
    }
}

/// Result of one classification call.
///
/// Never an error: every failure path is one of the tagged variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationOutcome {
    /// The reply was valid and is used unchanged.
    Classified(Classification),
    /// Category and explanation were valid; confidence was replaced by 0.5.
    ConfidenceDefaulted(Classification),
    /// The reply was unusable and the fallback triple applies.
    Fallback(FallbackReason),
}

impl ClassificationOutcome {
    pub fn classification(&self) -> Classification {
        match self {
            ClassificationOutcome::Classified(c) | ClassificationOutcome::ConfidenceDefaulted(c) => {
                c.clone()
            }
            ClassificationOutcome::Fallback(reason) => reason.classification(),
        }
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            ClassificationOutcome::Fallback(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ClassificationOutcome::Fallback(_))
    }
}

/// One triaged inbox message as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Source-system identifier; unique across the store.
    pub message_id: String,
    pub subject: String,
    pub content: String,
    /// When the message was sent, as reported by the source system.
    pub occurred_at: NaiveDateTime,
    pub category: TriageCategory,
    pub confidence: Confidence,
    pub explanation: String,
    /// When this record was created. Never updated.
    pub processed_at: DateTime<Utc>,
    pub is_read: bool,
    pub notes: Option<String>,
}

impl MessageRecord {
    /// Builds a freshly classified, unread record.
    pub fn new(
        message_id: String,
        subject: String,
        content: String,
        occurred_at: NaiveDateTime,
        classification: Classification,
        processed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            message_id,
            subject,
            content,
            occurred_at,
            category: classification.category,
            confidence: classification.confidence,
            explanation: classification.explanation,
            processed_at,
            is_read: false,
            notes: None,
        }
    }
}

/// Filter for listing stored records. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub category: Option<TriageCategory>,
    /// Inclusive lower bound on `occurred_at`.
    pub start: Option<NaiveDateTime>,
    /// Inclusive upper bound on `occurred_at`.
    pub end: Option<NaiveDateTime>,
}

/// Partial update of the mutable fields of a record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordPatch {
    #[serde(default)]
    pub category: Option<TriageCategory>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_read: Option<bool>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.notes.is_none() && self.is_read.is_none()
    }
}

/// Record counts per category plus the overall total.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryStats {
    pub total_messages: u64,
    /// Only categories with at least one record appear.
    pub categories: BTreeMap<TriageCategory, u64>,
}

/// A request to the external classification capability.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub system_instruction: String,
    pub user_prompt: String,
}

/// Raw reply from the external classification capability.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub id: String,
    /// Concatenated assistant text, unparsed.
    pub content: String,
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn category_round_trips_through_display_and_from_str() {
        for category in TriageCategory::ALL {
            let s = category.to_string();
            assert_eq!(s, category.as_str());
            assert_eq!(TriageCategory::from_str(&s).unwrap(), category);
        }
    }

    #[test]
    fn category_parsing_is_case_sensitive() {
        assert!(TriageCategory::from_str("critical").is_err());
        assert!(TriageCategory::from_str("URGENT").is_err());
    }

    #[test]
    fn category_orders_by_urgency() {
        assert!(TriageCategory::Critical < TriageCategory::High);
        assert!(TriageCategory::Low < TriageCategory::Reference);
    }

    #[test]
    fn category_serializes_uppercase() {
        let json = serde_json::to_string(&TriageCategory::Reference).unwrap();
        assert_eq!(json, "\"REFERENCE\"");
        let parsed: TriageCategory = serde_json::from_str("\"HIGH\"").unwrap();
        assert_eq!(parsed, TriageCategory::High);
    }

    #[test]
    fn confidence_bounds_are_inclusive() {
        assert!(Confidence::new(0.0).is_some());
        assert!(Confidence::new(1.0).is_some());
        assert!(Confidence::new(1.0001).is_none());
        assert!(Confidence::new(-0.2).is_none());
        assert!(Confidence::new(f64::NAN).is_none());
    }

    #[test]
    fn confidence_rejects_out_of_range_json() {
        assert!(serde_json::from_str::<Confidence>("1.7").is_err());
        let ok: Confidence = serde_json::from_str("0.25").unwrap();
        assert_eq!(ok.value(), 0.25);
    }

    #[test]
    fn fallback_classification_is_medium_half() {
        let c = FallbackReason::Transport("connection refused".into()).classification();
        assert_eq!(c.category, TriageCategory::Medium);
        assert_eq!(c.confidence, Confidence::DEFAULT);
        assert_eq!(c.explanation, "Error in classification: connection refused");
    }

    #[test]
    fn outcome_exposes_reason_only_for_fallback() {
        let ok = ClassificationOutcome::Classified(Classification {
            category: TriageCategory::Low,
            confidence: Confidence::new(0.9).unwrap(),
            explanation: "routine".into(),
        });
        assert!(ok.fallback_reason().is_none());
        assert!(!ok.is_fallback());

        let fb = ClassificationOutcome::Fallback(FallbackReason::InvalidCategory);
        assert_eq!(fb.fallback_reason(), Some(&FallbackReason::InvalidCategory));
        assert_eq!(fb.classification().explanation, "Invalid classification category");
    }

    #[test]
    fn stats_serialize_category_keys_as_strings() {
        let mut stats = CategoryStats::default();
        stats.total_messages = 3;
        stats.categories.insert(TriageCategory::High, 2);
        stats.categories.insert(TriageCategory::Critical, 1);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total_messages"], 3);
        assert_eq!(json["categories"]["HIGH"], 2);
        assert_eq!(json["categories"]["CRITICAL"], 1);
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(RecordPatch::default().is_empty());
        let patch: RecordPatch = serde_json::from_str(r#"{"is_read": true}"#).unwrap();
        assert!(!patch.is_empty());
        assert!(serde_json::from_str::<RecordPatch>(r#"{"category": "URGENT"}"#).is_err());
    }
}
