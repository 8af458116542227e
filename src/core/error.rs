//! Error handling for bundleprep
//!
//! Preprocessing failures are modelled by [`PreprocessError`], a strongly-typed
//! enum with one variant per failure kind. Every kind is fatal for the pass it
//! occurs in: there is no skip-and-continue mode, and callers receive a single
//! error for the whole value tree.
//!
//! The CLI converts any error into an [`ErrorContext`] via
//! [`user_friendly_error`], which adds details and a suggestion aimed at the
//! bundle author.
//!
//! # Examples
//!
//! ```rust,no_run
//! use bundleprep::core::{PreprocessError, user_friendly_error};
//!
//! let error = PreprocessError::RecursionDepthExceeded {
//!     max: 50,
//!     walker: "template",
//! };
//! assert!(error.to_string().starts_with("maximum recursion depth"));
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::constants::{MAX_TEMPLATE_RECURSION_DEPTH, TYPED_TOKEN_PREFIX};
use crate::templating::ValueType;

/// Failure of a preprocessing pass.
///
/// Leaf-level failures raised by the template walker are wrapped in
/// [`PreprocessError::Leaf`] so the message names the failing value. The
/// recursion-depth failure is never wrapped: its message always starts with
/// `maximum recursion depth`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreprocessError {
    /// A token carries the active prefix but a nonce from another pass.
    #[error("string {token} is wrapped with an incorrect nonce, expected {expected}, got {found}")]
    NonceMismatch {
        token: String,
        expected: String,
        found: String,
    },

    /// A token carries the active prefix and nonce but an unrecognized type tag.
    #[error("string {token} is wrapped with an unknown type: {value_type}")]
    UnknownValueType { token: String, value_type: String },

    /// An `int` or `float` payload could not be parsed.
    #[error("unable to unwrap token '{token}', with type {value_type}: {reason}")]
    MalformedPayload {
        token: String,
        value_type: ValueType,
        reason: String,
    },

    /// `asInt` or `asFloat` received a value with no scalar string form.
    #[error("cannot convert {input} to {value_type}")]
    UnsupportedConversion { value_type: ValueType, input: String },

    /// The template engine rejected or failed to evaluate a leaf.
    #[error("failed to render template '{template}': {message}")]
    Template {
        template: String,
        message: String,
        suggestions: Vec<String>,
    },

    /// A walker descended past [`MAX_TEMPLATE_RECURSION_DEPTH`].
    #[error("maximum recursion depth of {max} exceeded for {walker} processing, too many nested values")]
    RecursionDepthExceeded { max: usize, walker: &'static str },

    /// An explicitly supplied nonce cannot be embedded in a token.
    #[error("invalid nonce '{nonce}': {reason}")]
    InvalidNonce { nonce: String, reason: &'static str },

    /// Locates a failure at a leaf of the value tree.
    #[error("value at '{path}': {source}")]
    Leaf {
        path: String,
        source: Box<PreprocessError>,
    },
}

impl PreprocessError {
    /// Wrap this error with the location of the leaf that caused it.
    ///
    /// Depth failures and errors that already carry a location are returned
    /// unchanged.
    #[must_use]
    pub fn at(self, path: impl Into<String>) -> Self {
        match self {
            Self::RecursionDepthExceeded { .. } | Self::Leaf { .. } => self,
            other => Self::Leaf {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// The failure kind beneath any location wrappers.
    #[must_use]
    pub fn innermost(&self) -> &Self {
        match self {
            Self::Leaf { source, .. } => source.innermost(),
            other => other,
        }
    }

    /// Location of the failing leaf, if known.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Leaf { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Error wrapper carrying user-facing details and a suggestion.
#[derive(Debug)]
pub struct ErrorContext {
    /// The primary error message
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach additional details about the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions.
///
/// Preprocessing errors anywhere in the `anyhow` chain are recognized and
/// explained; YAML and I/O failures get generic hints; anything else is shown
/// with its full context chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(preprocess_error) =
        error.chain().find_map(|cause| cause.downcast_ref::<PreprocessError>())
    {
        let ctx = create_error_context(preprocess_error);
        // Keep the outer context (e.g. which cluster was being processed).
        return ErrorContext {
            message: format!("{error:#}"),
            ..ctx
        };
    }

    if error.chain().any(|cause| cause.downcast_ref::<serde_yaml::Error>().is_some()) {
        return ErrorContext::new(format!("{error:#}"))
            .with_suggestion("Check the YAML syntax of the input file")
            .with_details("Bundles and clusters are read as YAML documents");
    }

    let missing_file = error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<std::io::Error>())
        .any(|io_error| io_error.kind() == std::io::ErrorKind::NotFound);
    if missing_file {
        return ErrorContext::new(format!("{error:#}"))
            .with_suggestion("Check that the file exists and the path is correct");
    }

    ErrorContext::new(format!("{error:#}"))
}

fn create_error_context(error: &PreprocessError) -> ErrorContext {
    let ctx = ErrorContext::new(error.to_string());
    let ctx = match error.path() {
        Some(path) => ctx.with_details(format!("Failing value: {path}")),
        None => ctx,
    };

    match error.innermost() {
        PreprocessError::NonceMismatch { .. } => ctx.with_suggestion(format!(
            "Remove literal '{TYPED_TOKEN_PREFIX}:' strings from the values; typed values must come from asInt, asFloat, asBool or asNullable"
        )),
        PreprocessError::UnknownValueType { .. } => {
            ctx.with_suggestion("Supported typed value tags are: int, float, bool, nullable")
        }
        PreprocessError::MalformedPayload { value_type, .. } => ctx.with_suggestion(format!(
            "Make sure the expression piped into the {value_type} conversion renders a valid number"
        )),
        PreprocessError::UnsupportedConversion { .. } => ctx.with_suggestion(
            "asInt and asFloat need a scalar input; use the `default` filter to supply one for missing values",
        ),
        PreprocessError::Template { suggestions, .. } if !suggestions.is_empty() => {
            ctx.with_suggestion(format!("Did you mean: {}?", suggestions.join(", ")))
        }
        PreprocessError::Template { .. } => ctx.with_suggestion(
            "Check the expression syntax, or set helm.disablePreprocess: true to ship the values verbatim",
        ),
        PreprocessError::RecursionDepthExceeded { .. } => ctx.with_suggestion(format!(
            "Flatten the values tree; at most {MAX_TEMPLATE_RECURSION_DEPTH} levels of nesting are processed"
        )),
        PreprocessError::InvalidNonce { .. } => {
            ctx.with_suggestion("Use a non-empty nonce without ':' characters")
        }
        PreprocessError::Leaf { .. } => ctx,
    }
}
