//! `bundleprep render`: preprocess a bundle's Helm values for one cluster.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value};
use std::path::PathBuf;

use super::read_input;
use crate::config::{GlobalConfig, OutputFormat};
use crate::models::{BundleDeploymentOptions, Cluster};
use crate::preprocess::Preprocessor;

/// Render the Helm values of a bundle for a cluster.
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Bundle deployment options (YAML with a `helm` section)
    #[arg(long, value_name = "FILE")]
    pub bundle: PathBuf,

    /// Target cluster object (YAML)
    #[arg(long, value_name = "FILE")]
    pub cluster: PathBuf,

    /// Output format; defaults to the global config's `output_format`
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl RenderCommand {
    /// Run the command, printing the processed values to stdout.
    ///
    /// # Errors
    ///
    /// Fails if an input cannot be read or parsed, or preprocessing fails.
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        let format = self.format.unwrap_or(config.output_format);
        let output = self.render(config).await?;
        println!("{}", format_values(&output, format)?);
        Ok(())
    }

    /// Processed `helm.values`, empty if the bundle has no Helm section.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn render(&self, config: &GlobalConfig) -> Result<Map<String, Value>> {
        let mut options = BundleDeploymentOptions::from_yaml(
            &read_input(&self.bundle, "bundle").await?,
        )
        .with_context(|| format!("Invalid bundle file {}", self.bundle.display()))?;
        let cluster = Cluster::from_yaml(&read_input(&self.cluster, "cluster").await?)
            .with_context(|| format!("Invalid cluster file {}", self.cluster.display()))?;

        Preprocessor::new(config.to_preprocess_options())
            .preprocess_helm_values(&mut options, &cluster)
            .with_context(|| {
                format!("Failed to preprocess helm values for cluster '{}'", cluster.metadata.name)
            })?;

        Ok(options.helm.and_then(|helm| helm.values).unwrap_or_default())
    }
}

/// Serialize a values tree in the requested format.
pub(crate) fn format_values(values: &Map<String, Value>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(values).context("Failed to serialize values as JSON")
        }
        OutputFormat::Yaml => serde_yaml::to_string(values)
            .map(|s| s.trim_end().to_string())
            .context("Failed to serialize values as YAML"),
    }
}
