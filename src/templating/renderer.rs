//! Leaf rendering with Tera.
//!
//! [`LeafRenderer`] owns one Tera instance per preprocessing pass, with the
//! conversion filters of that pass's [`ConversionContext`] and the `index`
//! filter registered. Each string leaf is rendered independently with
//! [`Tera::render_str`], and Tera failures are turned into
//! [`PreprocessError`] values that name the template and, where possible,
//! suggest a correctly spelled variable or filter.

use regex::Regex;
use serde_json::Value;
use strsim::levenshtein;
use tera::{Context as TeraContext, Tera};

use super::conversion::ConversionContext;
use super::filters::{CUSTOM_FILTERS, index_filter};
use crate::core::{PreprocessError, Result};

/// Maximum Levenshtein distance, as a percentage of the target length, for a
/// name to be offered as a suggestion.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Maximum number of suggestions attached to an error.
const MAX_SUGGESTIONS: usize = 3;

/// How deep into the data context variable paths are collected for
/// suggestions.
const SUGGESTION_PATH_DEPTH: usize = 3;

/// Tera built-in filters most useful in values files, offered as suggestions.
const COMMON_BUILTIN_FILTERS: &[&str] = &[
    "upper", "lower", "trim", "replace", "join", "default", "length", "first", "last",
    "split", "json_encode", "as_str", "capitalize", "title", "truncate", "safe",
];

/// Renders single template strings for one preprocessing pass.
pub struct LeafRenderer {
    tera: Tera,
}

impl LeafRenderer {
    /// Create a renderer whose conversion filters are bound to `conversion`.
    #[must_use]
    pub fn new(conversion: &ConversionContext) -> Self {
        let mut tera = Tera::default();
        conversion.register_filters(&mut tera);
        tera.register_filter("index", index_filter);
        Self { tera }
    }

    /// Render `template` against `context`.
    ///
    /// # Errors
    ///
    /// A conversion failure raised inside a filter is returned as its own
    /// kind. Every other failure (syntax error, undefined variable, unknown
    /// filter) becomes [`PreprocessError::Template`].
    pub fn render(&mut self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera
            .render_str(template, context)
            .map_err(|e| Self::parse_tera_error(&e, template, context))
    }

    fn parse_tera_error(
        error: &tera::Error,
        template: &str,
        context: &TeraContext,
    ) -> PreprocessError {
        if let Some(inner) = find_preprocess_error(error) {
            return inner.clone();
        }

        let message = Self::format_tera_error(error);
        let suggestions = match Self::extract_missing_name(error) {
            Some(MissingName::Filter(name)) => {
                let available: Vec<String> = CUSTOM_FILTERS
                    .iter()
                    .chain(COMMON_BUILTIN_FILTERS)
                    .map(ToString::to_string)
                    .collect();
                Self::find_similar(&name, &available)
            }
            Some(MissingName::Variable(name)) => {
                let available = Self::extract_available_variables(context);
                Self::find_similar(&name, &available)
            }
            None => Vec::new(),
        };

        PreprocessError::Template {
            template: template.to_string(),
            message,
            suggestions,
        }
    }

    /// Identify the unknown filter or undefined variable behind a failure.
    fn extract_missing_name(error: &tera::Error) -> Option<MissingName> {
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);
        while let Some(err) = current {
            if let Some(tera_error) = err.downcast_ref::<tera::Error>() {
                match &tera_error.kind {
                    tera::ErrorKind::FilterNotFound(name) => {
                        return Some(MissingName::Filter(name.clone()));
                    }
                    tera::ErrorKind::Msg(msg) => {
                        if let Some(name) = Self::extract_variable_name(msg) {
                            return Some(MissingName::Variable(name));
                        }
                        if let Some(name) = Self::extract_filter_name(msg) {
                            return Some(MissingName::Filter(name));
                        }
                    }
                    _ => {}
                }
            }
            current = err.source();
        }
        None
    }

    /// Extract the variable name from a "Variable `foo` not found" message.
    fn extract_variable_name(error_msg: &str) -> Option<String> {
        let re = Regex::new(r"Variable `([^`]+)` not found").ok()?;
        re.captures(error_msg).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
    }

    fn extract_filter_name(error_msg: &str) -> Option<String> {
        let re = Regex::new(r"Filter '([^']+)' not found").ok()?;
        re.captures(error_msg).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
    }

    /// Dotted variable paths in the data context, a few levels deep.
    fn extract_available_variables(context: &TeraContext) -> Vec<String> {
        fn collect(prefix: &str, value: &Value, depth: usize, out: &mut Vec<String>) {
            let Value::Object(map) = value else {
                return;
            };
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                out.push(path.clone());
                if depth < SUGGESTION_PATH_DEPTH {
                    collect(&path, child, depth + 1, out);
                }
            }
        }

        let mut vars = Vec::new();
        collect("", &context.clone().into_json(), 1, &mut vars);
        vars
    }

    /// Find similar names using Levenshtein distance, closest first.
    fn find_similar(target: &str, available: &[String]) -> Vec<String> {
        let mut scored: Vec<_> = available
            .iter()
            .map(|candidate| (candidate.clone(), levenshtein(target, candidate)))
            .filter(|(_, distance)| *distance > 0)
            .collect();

        scored.sort_by_key(|(_, distance)| *distance);

        scored
            .into_iter()
            .filter(|(_, distance)| *distance <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
            .take(MAX_SUGGESTIONS)
            .map(|(candidate, _)| candidate)
            .collect()
    }

    /// Flatten a Tera error chain into one readable message.
    ///
    /// Tera reports one-off templates as `'__tera_one_off'`; those wrapper
    /// messages carry no information and are dropped.
    #[must_use]
    pub fn format_tera_error(error: &tera::Error) -> String {
        use std::error::Error;

        let mut all_messages = vec![error.to_string()];
        let mut current_error: Option<&dyn Error> = error.source();
        while let Some(err) = current_error {
            all_messages.push(err.to_string());
            current_error = err.source();
        }

        let messages: Vec<String> = all_messages
            .into_iter()
            .map(|msg| {
                msg.replace("while rendering '__tera_one_off'", "")
                    .replace("Failed to render '__tera_one_off'", "")
                    .replace("Failed to parse '__tera_one_off'", "")
                    .replace("'__tera_one_off'", "template")
                    .trim()
                    .to_string()
            })
            .filter(|msg| !msg.is_empty())
            .collect();

        if messages.is_empty() {
            "template evaluation failed".to_string()
        } else {
            messages.join(": ")
        }
    }
}

enum MissingName {
    Filter(String),
    Variable(String),
}

/// Find a conversion error chained into a Tera error by a filter.
fn find_preprocess_error(error: &tera::Error) -> Option<&PreprocessError> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(err) = current {
        if let Some(found) = err.downcast_ref::<PreprocessError>() {
            return Some(found);
        }
        current = err.source();
    }
    None
}
