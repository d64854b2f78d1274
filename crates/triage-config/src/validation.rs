// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::TriageConfig;

const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &TriageConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let classifier = &config.classifier;
    if classifier.model.trim().is_empty() {
        fail("classifier.model must not be empty".to_string());
    }
    if !classifier.base_url.starts_with("http://") && !classifier.base_url.starts_with("https://")
    {
        fail(format!(
            "classifier.base_url `{}` must be an http(s) URL",
            classifier.base_url
        ));
    }
    if !(0.0..=2.0).contains(&classifier.temperature) {
        fail(format!(
            "classifier.temperature must be between 0.0 and 2.0, got {}",
            classifier.temperature
        ));
    }
    if classifier.max_tokens == 0 {
        fail("classifier.max_tokens must be at least 1".to_string());
    }
    if classifier.timeout_secs == 0 {
        fail("classifier.timeout_secs must be at least 1".to_string());
    }

    if config.ingest.checkpoint_size == 0 {
        fail("ingest.checkpoint_size must be at least 1".to_string());
    }
    if config.ingest.run_timeout_secs == Some(0) {
        fail("ingest.run_timeout_secs must be at least 1 when set".to_string());
    }

    if config.gateway.host.trim().is_empty() {
        fail("gateway.host must not be empty".to_string());
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        fail(format!(
            "logging.level `{}` is not one of {}",
            config.logging.level,
            LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
