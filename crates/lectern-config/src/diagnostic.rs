// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment errors become [`ConfigError`]s that point at the offending line of
//! `lectern.toml` and, for misspelled keys, suggest the closest known key by
//! Jaro-Winkler similarity. Secrets that `serve` needs are reported with the
//! `LECTERN_*` variable that supplies them.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

use crate::loader::ENV_PREFIX;

/// Similarity a known key must reach to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key, or a whole `[section]`, that Lectern does not read.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(lectern::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// Dotted path, e.g. `payments.webhok_secret`.
        key: String,
        suggestion: Option<String>,
        /// Keys accepted at that level, comma separated.
        valid_keys: String,
        #[label("not a lectern setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(lectern::config::invalid_type), help("`{key}` takes {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that deserialized but breaks a cross-field or range rule.
    #[error("{message}")]
    #[diagnostic(code(lectern::config::validation))]
    Validation { message: String },

    /// A secret `serve` cannot start without.
    #[error("secret `{key}` is not set")]
    #[diagnostic(
        code(lectern::config::missing_secret),
        help("export {env_var}, or set `{field}` under `[{section}]` in lectern.toml")
    )]
    MissingSecret {
        key: &'static str,
        section: &'static str,
        field: &'static str,
        env_var: String,
    },

    /// The file could not be read as TOML at all.
    #[error("lectern.toml could not be parsed: {detail}")]
    #[diagnostic(code(lectern::config::unparsable))]
    Unparsable { detail: String },
}

impl ConfigError {
    /// Diagnostic for a dotted secret key such as `auth.jwt_secret`.
    pub fn missing_secret(key: &'static str) -> Self {
        let (section, field) = key.split_once('.').unwrap_or(("", key));
        Self::MissingSecret {
            key,
            section,
            field,
            env_var: env_var_for(key),
        }
    }
}

/// The `LECTERN_*` variable that overrides a dotted config key.
pub fn env_var_for(key: &str) -> String {
    format!("{ENV_PREFIX}{}", key.replace('.', "_").to_ascii_uppercase())
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Accepted here: {valid_keys}"),
        None => format!("accepted here: {valid_keys}"),
    }
}

/// Convert every error carried by a `figment::Error`.
///
/// `toml_sources` holds `(path, content)` pairs used to attach source spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let section: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    // The path may already end at the unknown key.
                    let mut section = section;
                    if section.last() == Some(field) {
                        section.pop();
                    }
                    let (span, src) = locate(&error, &section, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: dotted(&section, field),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::InvalidType(found, expected) => {
                    // The path ends at the offending key itself.
                    let (parent, field) = match section.split_last() {
                        Some((field, parent)) => (parent.to_vec(), field.clone()),
                        None => (Vec::new(), String::new()),
                    };
                    let (span, src) = locate(&error, &parent, &field, toml_sources);
                    ConfigError::InvalidType {
                        key: section.join("."),
                        found: found.to_string(),
                        expected: expected.to_string(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Unparsable {
                    detail: error.to_string(),
                },
            }
        })
        .collect()
}

fn dotted(section: &[String], field: &str) -> String {
    if section.is_empty() {
        field.to_string()
    } else {
        format!("{}.{field}", section.join("."))
    }
}

/// Resolve the span of `field` inside `section` in the file the error came from.
fn locate(
    error: &figment::error::Error,
    section: &[String],
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some(figment::Source::File(origin)) =
        error.metadata.as_ref().and_then(|m| m.source.as_ref())
    else {
        return (None, None);
    };
    let origin = origin.display().to_string();
    toml_sources
        .iter()
        .find(|(path, _)| *path == origin)
        .and_then(|(path, content)| {
            let offset = find_key_offset(content, section, field)?;
            Some((
                Some(SourceSpan::new(offset.into(), field.len())),
                Some(NamedSource::new(path, content.clone())),
            ))
        })
        .unwrap_or((None, None))
}

/// Byte offset of `field` as a key (or table header) under `section`.
///
/// Walks the file line by line tracking the current `[table]`. An empty
/// `section` matches top-level keys and table headers named `field`.
pub fn find_key_offset(content: &str, section: &[String], field: &str) -> Option<usize> {
    let wanted = section.join(".");
    let mut table = String::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        let trimmed = line.trim();

        if let Some(header) = trimmed.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            table = header.trim().to_string();
            if wanted.is_empty() && table == field {
                return Some(offset + indent + 1);
            }
        } else if table == wanted {
            let key = trimmed.split('=').next().map(str::trim);
            if key == Some(field) && trimmed.contains('=') {
                return Some(offset + indent);
            }
        }
        offset += line.len();
    }
    None
}

/// Best known key above the similarity threshold, if any.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render diagnostics to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}
