// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with fuzzy match suggestions.
//!
//! Figment errors are converted into [`ConfigError`] diagnostics carrying
//! source spans where the offending key can be located, plus Jaro-Winkler
//! "did you mean" suggestions for misspelled keys and enum values
//! (`capabilities = ["cod"]`, `provider = "electricitymaps"`).

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a suggestion to be offered.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(ecoroute::config::unknown_key),
        help("{}", suggestion_help(suggestion.as_deref(), "valid keys", valid))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        /// Comma-separated valid keys for the section.
        valid: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// An enum-valued key holds a value outside its variants.
    #[error("unknown value `{value}` for `{key}`")]
    #[diagnostic(
        code(ecoroute::config::unknown_value),
        help("{}", suggestion_help(suggestion.as_deref(), "valid values", valid))
    )]
    UnknownValue {
        key: String,
        value: String,
        suggestion: Option<String>,
        valid: String,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(ecoroute::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(ecoroute::config::missing_key),
        help("add `{key} = <value>` to your ecoroute.toml")
    )]
    MissingKey { key: String },

    /// A semantic constraint on a value failed.
    #[error("validation error: {message}")]
    #[diagnostic(code(ecoroute::config::validation))]
    Validation { message: String },

    /// Catch-all for other configuration errors.
    #[error("configuration error: {0}")]
    #[diagnostic(code(ecoroute::config::other))]
    Other(String),
}

fn suggestion_help(suggestion: Option<&str>, noun: &str, valid: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? {noun}: {valid}"),
        None => format!("{noun}: {valid}"),
    }
}

/// Convert a `figment::Error` (which may hold several errors) into diagnostics.
///
/// `toml_sources` pairs each config file path with its content so that
/// unknown keys can be pointed at in the file that declared them.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.clone();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, &path, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        suggestion: suggest_key(field, expected),
                        valid: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::UnknownVariant(value, expected) => ConfigError::UnknownValue {
                    key: path.join("."),
                    value: value.clone(),
                    suggestion: suggest_key(value, expected),
                    valid: expected.join(", "),
                },
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: qualified(&path, field),
                },
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    key: path.join("."),
                    detail: format!("found {actual}, expected {expected}"),
                    expected: expected.clone(),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn qualified(path: &[String], field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{field}", path.join("."))
    }
}

/// Resolve the file an error came from and the byte span of `field` inside it.
fn locate(
    error: &figment::error::Error,
    path: &[String],
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some(figment::Source::File(file)) = error.metadata.as_ref().and_then(|m| m.source.as_ref())
    else {
        return (None, None);
    };
    let file = file.display().to_string();

    let Some((name, content)) = toml_sources.iter().find(|(p, _)| *p == file) else {
        return (None, None);
    };

    match find_key_offset(content, path, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(name, content.clone())),
        ),
        None => (None, None),
    }
}

/// Find the byte offset of `field` as a key inside the section named by `path[0]`.
///
/// Both `[section]` and `[[section]]` headers are recognised. With an empty
/// path the search starts at the top of the file.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let mut in_section = path.is_empty();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();

        if trimmed.starts_with('[') {
            if let Some(section) = path.first() {
                let name = trimmed
                    .trim_end()
                    .trim_start_matches('[')
                    .trim_end_matches(']')
                    .trim();
                in_section = name == section;
            }
        } else if in_section
            && let Some(rest) = trimmed.strip_prefix(field)
            && rest.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }

        offset += line.len();
    }

    None
}

/// Suggest the closest valid key (or enum value) to `unknown`, if any is close enough.
pub fn suggest_key(unknown: &str, valid: &[&str]) -> Option<String> {
    valid
        .iter()
        .map(|candidate| (strsim::jaro_winkler(unknown, candidate), *candidate))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.to_string())
}

/// Render a list of `ConfigError`s to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_baseline_model_for_typo() {
        let valid = &["baseline_model", "code_model", "startup_timeout_secs"];
        assert_eq!(
            suggest_key("bseline_model", valid),
            Some("baseline_model".to_string())
        );
    }

    #[test]
    fn suggest_picks_closest_candidate() {
        let valid = &["low_threshold", "medium_threshold", "zone"];
        assert_eq!(
            suggest_key("medium_treshold", valid),
            Some("medium_threshold".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["zone", "api_key", "cache_secs"];
        assert_eq!(suggest_key("qqqqqqqq", valid), None);
    }

    #[test]
    fn find_key_offset_in_section() {
        let content = "[server]\nport = 80\n\n[carbon]\nzoen = \"DE\"\n";
        let path = vec!["carbon".to_string()];
        let o = find_key_offset(content, &path, "zoen").unwrap();
        assert_eq!(&content[o..o + 4], "zoen");
    }

    #[test]
    fn find_key_offset_ignores_other_sections() {
        let content = "[server]\nzoen = 1\n[carbon]\nzone = \"DE\"\n";
        let path = vec!["carbon".to_string()];
        assert_eq!(find_key_offset(content, &path, "zoen"), None);
    }

    #[test]
    fn find_key_offset_in_array_table() {
        let content = "[[models]]\nid = \"phi\"\n  energy = 0.1\n";
        let path = vec!["models".to_string()];
        let o = find_key_offset(content, &path, "energy").unwrap();
        assert_eq!(&content[o..o + 6], "energy");
    }

    #[test]
    fn help_text_includes_suggestion() {
        let help = suggestion_help(Some("zone"), "valid keys", "zone, api_key");
        assert_eq!(help, "did you mean `zone`? valid keys: zone, api_key");
    }
}
