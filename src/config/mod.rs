//! Configuration management for bundleprep.
//!
//! Only user-wide settings exist; bundles and clusters carry their own
//! options. See [`GlobalConfig`] for the file location and format.

mod global;

pub use global::{GlobalConfig, OutputFormat};
