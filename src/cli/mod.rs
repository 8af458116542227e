//! Command-line interface for bundleprep.
//!
//! # Commands
//!
//! - `render` - Preprocess a bundle's Helm values for one cluster
//! - `labels` - Substitute literal label placeholders only
//! - `wrap` - Show the typed token a conversion filter would produce
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all logging except errors
//! - `--config` - Use a specific global config file
//!
//! Logs go to stderr; processed values are printed to stdout.
//!
//! # Examples
//!
//! ```bash
//! bundleprep render --bundle fleet.yaml --cluster cluster.yaml
//! bundleprep --verbose render --bundle fleet.yaml --cluster cluster.yaml --format json
//! bundleprep labels --values values.yaml --labels labels.yaml
//! bundleprep wrap --type int 42
//! ```

mod labels;
mod render;
mod wrap;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::GlobalConfig;

pub use labels::LabelsCommand;
pub use render::RenderCommand;
pub use wrap::WrapCommand;

/// Type-preserving preprocessing of Helm values for Fleet-style bundles.
#[derive(Parser, Debug)]
#[command(
    name = "bundleprep",
    about = "Render templated Helm values per cluster while keeping native types",
    version,
    long_about = "bundleprep renders the templated string leaves of a bundle's Helm values \
                  against a target cluster's name, namespace, labels, annotations and template \
                  values, restoring ints, floats, bools and nulls marked with the asInt, asFloat, \
                  asBool and asNullable filters."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    ///
    /// Mutually exclusive with `--quiet`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the global config file.
    ///
    /// Overrides `BUNDLEPREP_CONFIG` and `~/.bundleprep/config.toml`.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Preprocess a bundle's Helm values for one cluster.
    Render(RenderCommand),

    /// Substitute literal label placeholders in a values file.
    Labels(LabelsCommand),

    /// Wrap a value into a typed token and unwrap it again.
    Wrap(WrapCommand),
}

impl Cli {
    /// Install logging, load the global config and run the command.
    ///
    /// # Errors
    ///
    /// Returns the command's error, with file and cluster context attached.
    pub async fn execute(self) -> Result<()> {
        init_logging(self.log_filter());

        let config = GlobalConfig::load_with_optional(self.config.clone()).await?;
        tracing::debug!("Loaded global config: {config:?}");

        match self.command {
            Commands::Render(cmd) => cmd.execute(&config).await,
            Commands::Labels(cmd) => cmd.execute(&config).await,
            Commands::Wrap(cmd) => cmd.execute(),
        }
    }

    /// Log filter derived from the verbosity flags.
    ///
    /// `None` defers to `RUST_LOG`, falling back to `info`.
    #[must_use]
    pub fn log_filter(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("error")
        } else {
            None
        }
    }
}

/// Install the stderr `fmt` subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Read a whole input file.
pub(crate) async fn read_input(path: &Path, what: &str) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {what} file {}", path.display()))
}
