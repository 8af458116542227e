//! Utility functions for the templating system.

use serde_json::Value;

/// Perform a deep merge of two JSON values.
///
/// Recursively merges `overrides` into `base`. For objects, fields from `overrides`
/// are added or replace fields in `base`. For arrays and primitives, `overrides`
/// completely replaces `base`.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use bundleprep::templating::deep_merge_json;
///
/// let base = json!({ "image": { "repo": "nginx", "tag": "1.25" } });
/// let overrides = json!({ "image": { "tag": "1.27" }, "replicas": 3 });
///
/// let result = deep_merge_json(base, &overrides);
/// assert_eq!(result, json!({ "image": { "repo": "nginx", "tag": "1.27" }, "replicas": 3 }));
/// ```
#[must_use]
pub fn deep_merge_json(mut base: Value, overrides: &Value) -> Value {
    match (base.as_object_mut(), overrides.as_object()) {
        (Some(base_obj), Some(override_obj)) => {
            for (key, override_value) in override_obj {
                match base_obj.get_mut(key) {
                    Some(base_value) if base_value.is_object() && override_value.is_object() => {
                        let merged = deep_merge_json(base_value.take(), override_value);
                        *base_value = merged;
                    }
                    _ => {
                        base_obj.insert(key.clone(), override_value.clone());
                    }
                }
            }
            base
        }
        (_, _) => overrides.clone(),
    }
}

/// Location of the entry `key` under `parent`, for error messages.
///
/// Plain identifiers are joined with dots; anything else is quoted in
/// brackets so keys containing dots stay unambiguous.
#[must_use]
pub fn child_key_path(parent: &str, key: &str) -> String {
    let plain = !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    match (parent.is_empty(), plain) {
        (true, true) => key.to_string(),
        (false, true) => format!("{parent}.{key}"),
        (_, false) => format!("{parent}[{key:?}]"),
    }
}

/// Location of element `index` under `parent`, for error messages.
#[must_use]
pub fn child_index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

/// Display form of a location; the root is shown as `<root>`.
#[must_use]
pub fn display_path(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}
