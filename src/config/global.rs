//! Global configuration for bundleprep.
//!
//! User-wide defaults live in a TOML file:
//!
//! - **Unix/macOS**: `~/.bundleprep/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\bundleprep\config.toml`
//!
//! The location can be overridden with the `BUNDLEPREP_CONFIG` environment
//! variable or the `--config` flag. A missing file yields the defaults.
//!
//! # File Format
//!
//! ```toml
//! # Output format of `bundleprep render`: "yaml" or "json"
//! output_format = "json"
//!
//! # Never render templates, even for bundles that enable preprocessing
//! force_disable_preprocess = false
//!
//! # Prefix of literal label placeholders
//! label_placeholder_prefix = "global.fleet.clusterLabels."
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::constants::{CONFIG_PATH_ENV, DEFAULT_LABEL_PLACEHOLDER_PREFIX};
use crate::preprocess::PreprocessOptions;

/// Serialization format for processed values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// User-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format of `render`.
    pub output_format: OutputFormat,

    /// Skip template rendering for every bundle.
    ///
    /// Label placeholders are still substituted.
    pub force_disable_preprocess: bool,

    /// Prefix of literal label placeholders.
    ///
    /// Default: `global.fleet.clusterLabels.`
    pub label_placeholder_prefix: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            force_disable_preprocess: false,
            label_placeholder_prefix: DEFAULT_LABEL_PLACEHOLDER_PREFIX.to_string(),
        }
    }
}

impl GlobalConfig {
    /// Load configuration from an optional path.
    ///
    /// Without an explicit path, `BUNDLEPREP_CONFIG` is consulted and then the
    /// default location. A file that does not exist yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if it sets an empty placeholder prefix.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::resolve_path(std::env::var_os(CONFIG_PATH_ENV))?,
        };

        if fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No global config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// sets an empty placeholder prefix.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))?;

        if config.label_placeholder_prefix.is_empty() {
            anyhow::bail!(
                "Invalid global config {}: label_placeholder_prefix must not be empty",
                path.display()
            );
        }
        Ok(config)
    }

    /// Default configuration file location.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or local data) directory is unknown.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("bundleprep")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".bundleprep")
        };

        Ok(config_dir.join("config.toml"))
    }

    fn resolve_path(env_override: Option<OsString>) -> Result<PathBuf> {
        match env_override {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Self::default_path(),
        }
    }

    /// Options for [`Preprocessor`](crate::preprocess::Preprocessor).
    #[must_use]
    pub fn to_preprocess_options(&self) -> PreprocessOptions {
        PreprocessOptions {
            force_disable_preprocess: self.force_disable_preprocess,
            label_placeholder_prefix: self.label_placeholder_prefix.clone(),
        }
    }
}
