//! bundleprep - type-preserving preprocessing of Helm values
//!
//! Fleet-style bundles deploy one set of Helm values to many clusters, with
//! per-cluster data (name, namespace, labels, annotations, template values)
//! substituted into the values before Helm sees them. Template engines only
//! produce text, so a naive pass turns `2` into `"2"` and breaks charts that
//! expect integers, booleans or nulls.
//!
//! bundleprep renders each string leaf with Tera and lets authors mark leaves
//! with a conversion filter (`asInt`, `asFloat`, `asBool`, `asNullable`). The
//! filter renders a typed token bound to a per-pass nonce, and the walker
//! turns every token back into the native value once rendering is done.
//!
//! # Core Modules
//!
//! - [`templating`] - Token codec, conversion context, Tera filters and both
//!   tree walkers (template and literal label substitution)
//! - [`preprocess`] - Per (bundle, cluster) orchestration
//! - [`models`] - Cluster and bundle deployment option models
//! - [`config`] - Global configuration (`~/.bundleprep/config.toml`)
//! - [`core`] - Error types and user-facing error formatting
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use bundleprep::models::{BundleDeploymentOptions, Cluster};
//! use bundleprep::preprocess::preprocess_helm_values;
//!
//! # fn main() -> anyhow::Result<()> {
//! let cluster = Cluster::from_yaml(&std::fs::read_to_string("cluster.yaml")?)?;
//! let mut options = BundleDeploymentOptions::from_yaml(&std::fs::read_to_string("fleet.yaml")?)?;
//!
//! preprocess_helm_values(&mut options, &cluster)?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod models;
pub mod preprocess;
pub mod templating;

// Test utilities (available for both unit and integration tests)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
