// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./triage.toml` > `~/.config/triage/triage.toml`
//! > `/etc/triage/triage.toml`, with environment variable overrides via the
//! `TRIAGE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TriageConfig;

/// Config sections, used to map `TRIAGE_<SECTION>_<KEY>` to `section.key`.
const SECTIONS: &[&str] = &["classifier", "storage", "ingest", "gateway", "logging"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/triage/triage.toml`
/// 3. `~/.config/triage/triage.toml`
/// 4. `./triage.toml`
/// 5. `TRIAGE_*` environment variables
pub fn load_config() -> Result<TriageConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<TriageConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TriageConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TriageConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TriageConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Paths searched by [`load_config`], lowest precedence first.
pub fn config_file_paths() -> Vec<std::path::PathBuf> {
    let mut paths = vec![std::path::PathBuf::from("/etc/triage/triage.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("triage/triage.toml"));
    }
    paths.push(std::path::PathBuf::from("triage.toml"));
    paths
}

/// Build the Figment used by [`load_config`] before extraction.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(TriageConfig::default()));
    for path in config_file_paths() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider())
}

/// Environment provider mapping `TRIAGE_SECTION_KEY` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `TRIAGE_CLASSIFIER_API_KEY` must become `classifier.api_key`.
fn env_provider() -> Env {
    Env::prefixed("TRIAGE_").map(|key| {
        // Env hands over the original case; config keys are lowercase.
        let key_str = key.as_str().to_ascii_lowercase();
        for section in SECTIONS {
            if let Some(rest) = key_str
                .strip_prefix(section)
                .and_then(|r| r.strip_prefix('_'))
            {
                return format!("{section}.{rest}").into();
            }
        }
        key_str.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FailurePolicy;

    #[test]
    fn env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("TRIAGE_CLASSIFIER_API_KEY", "sk-env");
            jail.set_env("TRIAGE_INGEST_FAILURE_POLICY", "collect");
            jail.set_env("TRIAGE_GATEWAY_PORT", "9100");

            let config = load_config()?;
            assert_eq!(config.classifier.api_key.as_deref(), Some("sk-env"));
            assert_eq!(config.ingest.failure_policy, FailurePolicy::Collect);
            assert_eq!(config.gateway.port, 9100);
            Ok(())
        });
    }

    #[test]
    fn local_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "triage.toml",
                r#"
                [ingest]
                checkpoint_size = 25
                "#,
            )?;
            let config = load_config()?;
            assert_eq!(config.ingest.checkpoint_size, 25);
            assert_eq!(config.classifier.model, "gpt-4-turbo-preview");
            Ok(())
        });
    }

    #[test]
    fn explicit_path_is_loaded() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[logging]\nlevel = \"debug\"\n")?;
            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.logging.level, "debug");
            Ok(())
        });
    }
}
