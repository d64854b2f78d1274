// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with "did you mean?" suggestions.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a key suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// A configuration error with diagnostic context for miette rendering.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key not present in the configuration model.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(triage::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that does not deserialize into the expected type.
    #[error("invalid type for key `{key}`: found {found}")]
    #[diagnostic(code(triage::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
    },

    /// An enum value outside the accepted variants.
    #[error("invalid value `{value}` for key `{key}`")]
    #[diagnostic(code(triage::config::invalid_value), help("expected one of: {expected}"))]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(code(triage::config::missing_key))]
    MissingKey { key: String },

    /// A semantic check that failed after deserialization.
    #[error("validation error: {message}")]
    #[diagnostic(code(triage::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(triage::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error carried by a `figment::Error` into a `ConfigError`.
///
/// `sources` pairs a file path (or `<inline>`) with its TOML text and is used
/// to attach a source span to unknown-key errors.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let key = error.path.join(".");
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, field, sources);
                    ConfigError::UnknownKey {
                        key: qualified(&key, field),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::UnknownVariant(value, expected) => ConfigError::InvalidValue {
                    key,
                    value: value.clone(),
                    expected: expected.join(", "),
                },
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: qualified(&key, field),
                },
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    key,
                    found: actual.to_string(),
                    expected: expected.clone(),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Dotted key for `field`, whether or not figment already appended it to the path.
fn qualified(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else if path == field || path.ends_with(&format!(".{field}")) {
        path.to_string()
    } else {
        format!("{path}.{field}")
    }
}

/// Find the span of `field` inside the TOML source the error came from.
fn locate(
    error: &figment::Error,
    field: &str,
    sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .map(|source| match source {
            figment::Source::File(path) => path.display().to_string(),
            _ => "<inline>".to_string(),
        });

    let Some((name, content)) = origin
        .as_deref()
        .and_then(|o| sources.iter().find(|(name, _)| name == o))
    else {
        return (None, None);
    };

    let section = error
        .path
        .first()
        .filter(|s| s.as_str() != field)
        .map(String::as_str);
    match find_key_offset(content, section, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(name, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` as a key line, searched after `[section]` if given.
pub fn find_key_offset(content: &str, section: Option<&str>, field: &str) -> Option<usize> {
    let start = match section {
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
        None => 0,
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(after) = trimmed.strip_prefix(field)
            && after.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Best Jaro-Winkler match for `unknown` among `valid_keys`, if close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render errors to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        if handler.render_report(&mut buf, error as &dyn Diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}
