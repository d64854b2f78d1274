// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply validation and the fallback ladder.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;
use triage_core::types::{Classification, ClassificationOutcome, Confidence, FallbackReason};
use triage_core::TriageCategory;

static FENCE_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```json\s*").unwrap());
static FENCE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*```").unwrap());

const REQUIRED_FIELDS: [&str; 3] = ["category", "confidence", "explanation"];

/// Removes markdown code-fence markup around a JSON reply.
pub fn strip_code_fence(reply: &str) -> String {
    let without_open = FENCE_OPEN.replace_all(reply.trim(), "");
    FENCE_CLOSE.replace_all(&without_open, "").trim().to_string()
}

/// Validates a raw reply into a classification outcome.
///
/// Ladder, first failure wins: not JSON, missing or mistyped fields, unknown
/// category. An unusable confidence keeps category and explanation and
/// substitutes 0.5.
pub fn parse_reply(reply: &str) -> ClassificationOutcome {
    let cleaned = strip_code_fence(reply);

    let value: Value = match serde_json::from_str(&cleaned) {
        Ok(v) => v,
        Err(e) => return fallback(FallbackReason::Unparseable, reply, &e.to_string()),
    };

    let Some(object) = value.as_object() else {
        return fallback(FallbackReason::InvalidFormat, reply, "reply is not a JSON object");
    };
    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !object.contains_key(**f)) {
        return fallback(
            FallbackReason::InvalidFormat,
            reply,
            &format!("missing field `{missing}`"),
        );
    }

    let Some(category) = object["category"]
        .as_str()
        .and_then(|s| s.parse::<TriageCategory>().ok())
    else {
        return fallback(
            FallbackReason::InvalidCategory,
            reply,
            &format!("category {}", object["category"]),
        );
    };

    let explanation = match object["explanation"].as_str().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => {
            return fallback(
                FallbackReason::InvalidFormat,
                reply,
                "explanation is not a non-empty string",
            );
        }
    };

    match coerce_confidence(object) {
        Some(confidence) => ClassificationOutcome::Classified(Classification {
            category,
            confidence,
            explanation,
        }),
        None => {
            warn!(
                kind = "confidence",
                confidence = %object["confidence"],
                "classifier confidence unusable, defaulting to 0.5"
            );
            ClassificationOutcome::ConfidenceDefaulted(Classification {
                category,
                confidence: Confidence::DEFAULT,
                explanation,
            })
        }
    }
}

/// Accepts JSON numbers and numeric strings within `[0, 1]`.
fn coerce_confidence(object: &Map<String, Value>) -> Option<Confidence> {
    let raw = match &object["confidence"] {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Confidence::new(raw)
}

fn fallback(reason: FallbackReason, raw: &str, detail: &str) -> ClassificationOutcome {
    warn!(kind = reason.kind(), detail, raw, "classifier reply rejected, using fallback");
    ClassificationOutcome::Fallback(reason)
}
