//! Literal label-placeholder substitution.
//!
//! [`LabelSubstitutionProcessor`] walks a values tree and replaces every
//! string leaf that exactly equals a known placeholder with the matching
//! label value. Mapping keys are substituted the same way unless disabled.
//! No template engine is involved and output leaves are always strings;
//! non-matching strings and non-string scalars are left unchanged.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use super::guard::DepthGuard;
use crate::constants::MAX_TEMPLATE_RECURSION_DEPTH;
use crate::core::Result;

const WALKER: &str = "label";

/// Exact-match placeholder substitution over values trees.
#[derive(Debug, Clone)]
pub struct LabelSubstitutionProcessor {
    placeholders: BTreeMap<String, String>,
    substitute_keys: bool,
    max_depth: usize,
}

impl LabelSubstitutionProcessor {
    /// Create a processor from a placeholder → replacement table.
    ///
    /// Keys are substituted by default.
    #[must_use]
    pub fn new(placeholders: BTreeMap<String, String>) -> Self {
        Self {
            placeholders,
            substitute_keys: true,
            max_depth: MAX_TEMPLATE_RECURSION_DEPTH,
        }
    }

    /// Build the table from cluster labels: `<prefix><label>` → label value.
    #[must_use]
    pub fn from_cluster_labels(prefix: &str, labels: &BTreeMap<String, String>) -> Self {
        let placeholders = labels
            .iter()
            .map(|(name, value)| (format!("{prefix}{name}"), value.clone()))
            .collect();
        Self::new(placeholders)
    }

    /// Enable or disable substitution of mapping keys.
    #[must_use]
    pub fn with_key_substitution(mut self, enabled: bool) -> Self {
        self.substitute_keys = enabled;
        self
    }

    /// Override the nesting bound.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The placeholder table.
    #[must_use]
    pub fn placeholders(&self) -> &BTreeMap<String, String> {
        &self.placeholders
    }

    /// Process a whole tree, returning a new one.
    ///
    /// # Errors
    ///
    /// Only exceeding the nesting bound fails.
    pub fn process(&self, value: &Value) -> Result<Value> {
        self.walk(value, DepthGuard::with_max(WALKER, self.max_depth))
    }

    /// Process a values mapping, returning a new one.
    ///
    /// # Errors
    ///
    /// Only exceeding the nesting bound fails.
    pub fn process_map(&self, values: &Map<String, Value>) -> Result<Map<String, Value>> {
        self.walk_map(values, DepthGuard::with_max(WALKER, self.max_depth))
    }

    fn walk(&self, value: &Value, guard: DepthGuard) -> Result<Value> {
        guard.check()?;

        match value {
            Value::Object(map) => self.walk_map(map, guard).map(Value::Object),
            Value::Array(items) => items
                .iter()
                .map(|item| self.walk(item, guard.descend()))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Value::String(s) => Ok(Value::String(self.substitute(s).to_string())),
            other => Ok(other.clone()),
        }
    }

    fn walk_map(&self, map: &Map<String, Value>, guard: DepthGuard) -> Result<Map<String, Value>> {
        guard.check()?;

        let mut out = Map::with_capacity(map.len());
        for (key, child) in map {
            let key = if self.substitute_keys {
                self.substitute(key)
            } else {
                key.as_str()
            };
            out.insert(key.to_string(), self.walk(child, guard.descend())?);
        }
        Ok(out)
    }

    fn substitute<'a>(&'a self, s: &'a str) -> &'a str {
        match self.placeholders.get(s) {
            Some(replacement) => {
                debug!("Substituted label placeholder '{s}'");
                replacement
            }
            None => s,
        }
    }
}

/// Substitute `<prefix><label>` placeholders in `values` with cluster labels.
///
/// # Errors
///
/// Only exceeding the nesting bound fails.
pub fn process_label_values(
    values: &Map<String, Value>,
    prefix: &str,
    labels: &BTreeMap<String, String>,
) -> Result<Map<String, Value>> {
    LabelSubstitutionProcessor::from_cluster_labels(prefix, labels).process_map(values)
}
