//! Test utilities for bundleprep
//!
//! This module provides logging setup for tests and YAML fixtures for
//! clusters and bundles.
//!
//! # Example
//!
//! ```rust,no_run
//! use bundleprep::test_utils::{BundleFixture, ClusterFixture, init_test_logging};
//!
//! init_test_logging(None);
//! let dir = tempfile::tempdir().unwrap();
//! let bundle = BundleFixture::typed().write_to(dir.path()).unwrap();
//! let cluster = ClusterFixture::basic().write_to(dir.path()).unwrap();
//! ```

pub mod fixtures;

pub use fixtures::{BundleFixture, ClusterFixture, nested_values_yaml};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Initializes the tracing subscriber once regardless of how many times it
/// is called. Uses `level` if given, else `RUST_LOG`; with neither, tests
/// run without logging.
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
