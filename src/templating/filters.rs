//! Custom Tera filters available to value templates.
//!
//! - `asInt`, `asFloat`, `asBool`, `asNullable`: wrap the piped value into a
//!   typed token bound to the pass's [`ConversionContext`]
//! - `index`: look up a key in a mapping (or a position in a sequence)
//!   without failing on a missing mapping key
//!
//! # Examples
//!
//! ```yaml
//! replicaCount: "{{ Values.replicaCount | asInt }}"
//! ratio: "{{ Values.ratio | asFloat }}"
//! enabled: "{{ ClusterLabels | index(key='monitoring') | asBool }}"
//! storageClass: "{{ Values | index(key='storageClass') | asNullable }}"
//! ```

use std::collections::HashMap;
use tera::Value;

use super::conversion::ConversionContext;
use super::token::ValueType;

/// Names of every filter registered in addition to Tera's built-ins.
pub const CUSTOM_FILTERS: &[&str] = &["asInt", "asFloat", "asBool", "asNullable", "index"];

/// Create the conversion filter for `value_type`.
///
/// The filter output is the wrapped token text. A conversion failure is
/// chained into the Tera error so the walker can recover the typed
/// [`PreprocessError`](crate::core::PreprocessError).
pub fn create_conversion_filter(
    ctx: ConversionContext,
    value_type: ValueType,
) -> impl tera::Filter + 'static {
    move |value: &Value, _args: &HashMap<String, Value>| -> tera::Result<Value> {
        let token = ctx.wrap(value_type, value).map_err(|e| {
            tera::Error::chain(format!("{} filter failed", value_type.filter_name()), e)
        })?;
        Ok(Value::String(token.into_string()))
    }
}

/// Look up `key` in the piped value.
///
/// A missing mapping key yields `null` and indexing `null` yields `null`, so
/// lookups can be chained and finished with `asNullable` or `default`. An
/// out-of-range sequence position or indexing a scalar is an error.
pub fn index_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let key = args
        .get("key")
        .ok_or_else(|| tera::Error::msg("index filter requires a `key` argument"))?;

    match (value, key) {
        (Value::Null, _) => Ok(Value::Null),
        (Value::Object(map), Value::String(name)) => {
            Ok(map.get(name).cloned().unwrap_or(Value::Null))
        }
        (Value::Object(map), Value::Number(n)) => {
            Ok(map.get(&n.to_string()).cloned().unwrap_or(Value::Null))
        }
        (Value::Array(items), Value::Number(n)) => n
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| items.get(i))
            .cloned()
            .ok_or_else(|| {
                tera::Error::msg(format!(
                    "index {n} out of range for sequence of length {}",
                    items.len()
                ))
            }),
        (other, key) => Err(tera::Error::msg(format!(
            "cannot index {} with key {key}",
            kind_name(other)
        ))),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
