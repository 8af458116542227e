//! Core types for bundleprep
//!
//! Holds the error type shared by every stage of a preprocessing pass. See
//! [`error`] for the individual failure kinds.

pub mod error;

pub use error::{ErrorContext, PreprocessError, user_friendly_error};

/// Result alias for preprocessing operations.
pub type Result<T, E = PreprocessError> = std::result::Result<T, E>;
