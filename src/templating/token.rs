//! Typed tokens: smuggling native values through string-only rendering.
//!
//! Tera renders every expression to text, so `{{ Values.replicas }}` can only
//! ever produce the string `"2"`. The conversion filters instead render a
//! wrapped token of the form
//!
//! ```text
//! <prefix>:<nonce>:<type>:<payload>
//! ```
//!
//! and the walker unwraps each rendered leaf back into a native value once
//! rendering is done. The prefix marks the scheme; the nonce ties a token to
//! the [`ConversionContext`] of one pass, so a token copied from another pass
//! (or typed by hand) is rejected instead of silently trusted.
//!
//! Wrapping never validates the payload. A malformed number is only reported
//! when the token is unwrapped.

use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

use super::conversion::ConversionContext;
use crate::constants::{TYPED_TOKEN_DELIMITER, TYPED_TOKEN_SEGMENTS};
use crate::core::{PreprocessError, Result};

/// Native type a wrapped token resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Signed 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// Boolean with permissive truthiness
    Bool,
    /// `null` for empty-ish payloads, the payload string otherwise
    Nullable,
}

impl ValueType {
    /// Every supported type, in tag order.
    pub const ALL: [Self; 4] = [Self::Int, Self::Float, Self::Bool, Self::Nullable];

    /// Tag written into the type segment of a token.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Nullable => "nullable",
        }
    }

    /// Name of the template filter producing this type.
    #[must_use]
    pub const fn filter_name(self) -> &'static str {
        match self {
            Self::Int => "asInt",
            Self::Float => "asFloat",
            Self::Bool => "asBool",
            Self::Nullable => "asNullable",
        }
    }

    /// Parse a type tag. Tags are case-sensitive.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|value_type| value_type.tag() == tag)
    }

    fn parse_payload(self, payload: &str) -> std::result::Result<Value, String> {
        match self {
            Self::Int => payload
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| format!("invalid integer literal '{payload}': {e}")),
            Self::Float => {
                let parsed = payload
                    .parse::<f64>()
                    .map_err(|e| format!("invalid float literal '{payload}': {e}"))?;
                Number::from_f64(parsed)
                    .map(Value::Number)
                    .ok_or_else(|| format!("'{payload}' is not a finite number"))
            }
            Self::Bool => Ok(Value::Bool(is_truthy(payload))),
            Self::Nullable => Ok(if matches!(payload, "" | "nil" | "null") {
                Value::Null
            } else {
                Value::String(payload.to_string())
            }),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| {
            let known: Vec<_> = Self::ALL.iter().map(|t| t.tag()).collect();
            format!("unknown value type '{s}', expected one of: {}", known.join(", "))
        })
    }
}

/// Falsy payloads: blank, `0`, or any casing of `false`.
fn is_truthy(payload: &str) -> bool {
    let trimmed = payload.trim();
    !(trimmed.is_empty() || trimmed == "0" || trimmed.eq_ignore_ascii_case("false"))
}

/// A rendered string that may encode a typed value.
///
/// The token is an immutable wrapper around text. Whether it is wrapped can
/// only be decided against the [`ConversionContext`] of the current pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypedToken(String);

impl TypedToken {
    /// Create a token from arbitrary text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The underlying text, unchanged.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the token, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Split into exactly four segments, or `None` for ordinary text.
    ///
    /// Only the first three delimiters split; the payload may contain `:`.
    fn segments(&self) -> Option<[&str; TYPED_TOKEN_SEGMENTS]> {
        let mut parts = self.0.splitn(TYPED_TOKEN_SEGMENTS, TYPED_TOKEN_DELIMITER);
        let segments = [parts.next()?, parts.next()?, parts.next()?, parts.next()?];
        Some(segments)
    }

    /// Prefix segment, if the token has four segments.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.segments().map(|s| s[0])
    }

    /// Nonce segment, if the token has four segments.
    #[must_use]
    pub fn nonce(&self) -> Option<&str> {
        self.segments().map(|s| s[1])
    }

    /// Type segment, if the token has four segments.
    #[must_use]
    pub fn type_tag(&self) -> Option<&str> {
        self.segments().map(|s| s[2])
    }

    /// Payload segment, if the token has four segments.
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        self.segments().map(|s| s[3])
    }

    /// Decide whether this token was wrapped by `ctx`.
    ///
    /// Text with fewer than four segments, an empty prefix, nonce or type
    /// segment, or a foreign prefix is ordinary text.
    ///
    /// # Errors
    ///
    /// - [`PreprocessError::NonceMismatch`] when the prefix matches but the
    ///   nonce belongs to another pass
    /// - [`PreprocessError::UnknownValueType`] when prefix and nonce match but
    ///   the type tag is not recognized
    pub fn is_wrapped(&self, ctx: &ConversionContext) -> Result<bool> {
        Ok(self.wrapped_type(ctx)?.is_some())
    }

    fn wrapped_type(&self, ctx: &ConversionContext) -> Result<Option<(ValueType, &str)>> {
        let Some([prefix, nonce, tag, payload]) = self.segments() else {
            return Ok(None);
        };

        if prefix.is_empty() || nonce.is_empty() || tag.is_empty() || prefix != ctx.prefix() {
            return Ok(None);
        }

        if nonce != ctx.nonce() {
            return Err(PreprocessError::NonceMismatch {
                token: self.0.clone(),
                expected: ctx.nonce().to_string(),
                found: nonce.to_string(),
            });
        }

        match ValueType::from_tag(tag) {
            Some(value_type) => Ok(Some((value_type, payload))),
            None => Err(PreprocessError::UnknownValueType {
                token: self.0.clone(),
                value_type: tag.to_string(),
            }),
        }
    }

    /// Resolve the token to a native value.
    ///
    /// Ordinary text comes back as a string, exactly as given. Wrapped tokens
    /// are parsed according to their type tag:
    ///
    /// | type       | result                                                         |
    /// |------------|----------------------------------------------------------------|
    /// | `int`      | base-10 `i64`                                                  |
    /// | `float`    | `f64`; integer literals are accepted                           |
    /// | `bool`     | `false` for blank, `0` or `false` (any case), `true` otherwise |
    /// | `nullable` | `null` for `""`, `nil`, `null`; the payload otherwise          |
    ///
    /// # Errors
    ///
    /// Everything [`is_wrapped`](Self::is_wrapped) reports, plus
    /// [`PreprocessError::MalformedPayload`] when an `int` or `float` payload
    /// does not parse.
    pub fn unwrap(&self, ctx: &ConversionContext) -> Result<Value> {
        let Some((value_type, payload)) = self.wrapped_type(ctx)? else {
            return Ok(Value::String(self.0.clone()));
        };

        value_type.parse_payload(payload).map_err(|reason| PreprocessError::MalformedPayload {
            token: self.0.clone(),
            value_type,
            reason,
        })
    }

    /// Wrap this token's text as a payload of `value_type` for `ctx`.
    #[must_use]
    pub fn wrap(&self, value_type: ValueType, ctx: &ConversionContext) -> Self {
        let delimiter = TYPED_TOKEN_DELIMITER;
        Self(format!(
            "{prefix}{delimiter}{nonce}{delimiter}{tag}{delimiter}{payload}",
            prefix = ctx.prefix(),
            nonce = ctx.nonce(),
            tag = value_type.tag(),
            payload = self.0,
        ))
    }
}

impl fmt::Display for TypedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TypedToken {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for TypedToken {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}
