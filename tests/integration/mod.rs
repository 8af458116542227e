//! Integration test suite for bundleprep
//!
//! End-to-end tests of the preprocessing pipeline through the public library
//! API and the `bundleprep` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **preprocess**: Orchestrator behavior on full bundle and cluster YAML
//! - **cli**: The `render`, `labels` and `wrap` commands, exit codes and
//!   error reports
//! - **global_config**: Config file discovery and its effect on rendering

mod cli;
mod global_config;
mod preprocess;
