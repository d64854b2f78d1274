// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the triage workspace.
//!
//! TOML parsing with strict key checking, XDG file lookup, `TRIAGE_*`
//! environment overrides, and miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use triage_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("checkpoint size: {}", config.ingest.checkpoint_size);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    ClassifierConfig, FailurePolicy, GatewayConfig, IngestConfig, LoggingConfig, StorageConfig,
    TriageConfig,
};

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<TriageConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<TriageConfig, Vec<ConfigError>> {
    if !path.exists() {
        return Err(vec![ConfigError::Other(format!(
            "config file `{}` does not exist",
            path.display()
        ))]);
    }
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<TriageConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<TriageConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<TriageConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            tracing::debug!(
                database = %config.storage.database_path,
                model = %config.classifier.model,
                "configuration loaded"
            );
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Read the XDG config files that exist, for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    loader::config_file_paths()
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let name = if path.is_relative() {
                std::env::current_dir()
                    .map(|d| d.join(&path))
                    .unwrap_or(path)
            } else {
                path
            };
            Some((name.display().to_string(), content))
        })
        .collect()
}
