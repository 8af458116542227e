//! Per-pass conversion context and the typed-wrap helpers.
//!
//! A [`ConversionContext`] is created once per preprocessing pass (one
//! bundle, one target cluster) and dropped afterwards. Its nonce is what makes
//! tokens from other passes detectable, so a context must never be shared
//! between passes, including concurrent ones.

use chrono::Utc;
use serde_json::Value;
use tera::Tera;
use uuid::Uuid;

use super::filters::create_conversion_filter;
use super::token::{TypedToken, ValueType};
use crate::constants::{TYPED_TOKEN_DELIMITER, TYPED_TOKEN_PREFIX};
use crate::core::{PreprocessError, Result};

/// Prefix and nonce for one preprocessing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionContext {
    prefix: &'static str,
    nonce: String,
}

impl ConversionContext {
    /// Create a context with a fresh nonce.
    ///
    /// The nonce joins the current UTC time in nanoseconds with a random v4
    /// UUID, so two passes started in the same instant still differ.
    #[must_use]
    pub fn new() -> Self {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        Self {
            prefix: TYPED_TOKEN_PREFIX,
            nonce: format!("{nanos}{}", Uuid::new_v4().simple()),
        }
    }

    /// Create a context with a caller-chosen nonce.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::InvalidNonce`] if the nonce is empty or
    /// contains the token delimiter.
    pub fn with_nonce(nonce: impl Into<String>) -> Result<Self> {
        let nonce = nonce.into();
        if nonce.is_empty() {
            return Err(PreprocessError::InvalidNonce {
                nonce,
                reason: "nonce must not be empty",
            });
        }
        if nonce.contains(TYPED_TOKEN_DELIMITER) {
            return Err(PreprocessError::InvalidNonce {
                nonce,
                reason: "nonce must not contain ':'",
            });
        }
        Ok(Self {
            prefix: TYPED_TOKEN_PREFIX,
            nonce,
        })
    }

    /// The fixed scheme prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.prefix
    }

    /// The nonce of this pass.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Convert `input` to its canonical string and wrap it as `value_type`.
    ///
    /// `null`, sequences and mappings have no scalar form: they are rejected
    /// for `int` and `float`, and become the empty payload for `bool` and
    /// `nullable` (which then unwrap to `false` and `null`).
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::UnsupportedConversion`] for non-scalar input
    /// to an `int` or `float` conversion.
    pub fn wrap(&self, value_type: ValueType, input: &Value) -> Result<TypedToken> {
        let text = match (canonical_string(input), value_type) {
            (Some(text), _) => text,
            (None, ValueType::Bool | ValueType::Nullable) => String::new(),
            (None, ValueType::Int | ValueType::Float) => {
                return Err(PreprocessError::UnsupportedConversion {
                    value_type,
                    input: input.to_string(),
                });
            }
        };
        Ok(TypedToken::new(text).wrap(value_type, self))
    }

    /// Wrap `input` to be unwrapped as an `i64`.
    ///
    /// # Errors
    ///
    /// Fails on `null`, sequences and mappings.
    pub fn as_int(&self, input: &Value) -> Result<TypedToken> {
        self.wrap(ValueType::Int, input)
    }

    /// Wrap `input` to be unwrapped as an `f64`.
    ///
    /// # Errors
    ///
    /// Fails on `null`, sequences and mappings.
    pub fn as_float(&self, input: &Value) -> Result<TypedToken> {
        self.wrap(ValueType::Float, input)
    }

    /// Wrap `input` to be unwrapped as a `bool`.
    ///
    /// # Errors
    ///
    /// Never fails; the `Result` mirrors the other helpers.
    pub fn as_bool(&self, input: &Value) -> Result<TypedToken> {
        self.wrap(ValueType::Bool, input)
    }

    /// Wrap `input` to be unwrapped as `null` when empty.
    ///
    /// # Errors
    ///
    /// Never fails; the `Result` mirrors the other helpers.
    pub fn as_nullable(&self, input: &Value) -> Result<TypedToken> {
        self.wrap(ValueType::Nullable, input)
    }

    /// Resolve a rendered string to its native value.
    ///
    /// # Errors
    ///
    /// See [`TypedToken::unwrap`].
    pub fn unwrap(&self, raw: &str) -> Result<Value> {
        TypedToken::new(raw).unwrap(self)
    }

    /// Register `asInt`, `asFloat`, `asBool` and `asNullable` on `tera`.
    pub fn register_filters(&self, tera: &mut Tera) {
        for value_type in ValueType::ALL {
            tera.register_filter(
                value_type.filter_name(),
                create_conversion_filter(self.clone(), value_type),
            );
        }
    }
}

impl Default for ConversionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical string form of a scalar, or `None` for `null` and composites.
///
/// Floats use the shortest representation that round-trips, so `0.544`
/// stays `"0.544"` and `2.0` becomes `"2"`.
#[must_use]
pub fn canonical_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => Some(f.to_string()),
            _ => Some(n.to_string()),
        },
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
