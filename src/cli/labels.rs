//! `bundleprep labels`: literal label placeholder substitution only.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::read_input;
use super::render::format_values;
use crate::config::{GlobalConfig, OutputFormat};
use crate::templating::LabelSubstitutionProcessor;

/// Substitute `<prefix><label>` placeholders in a values file.
#[derive(Args, Debug)]
pub struct LabelsCommand {
    /// Values tree (YAML mapping)
    #[arg(long, value_name = "FILE")]
    pub values: PathBuf,

    /// Cluster labels (YAML mapping of label name to value)
    #[arg(long, value_name = "FILE")]
    pub labels: PathBuf,

    /// Leave mapping keys untouched
    #[arg(long)]
    pub no_keys: bool,

    /// Output format; defaults to the global config's `output_format`
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl LabelsCommand {
    /// Run the command, printing the substituted values to stdout.
    ///
    /// # Errors
    ///
    /// Fails if an input cannot be read or parsed, or the tree is too deep.
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        let format = self.format.unwrap_or(config.output_format);
        let output = self.substitute(config).await?;
        println!("{}", format_values(&output, format)?);
        Ok(())
    }

    async fn substitute(&self, config: &GlobalConfig) -> Result<Map<String, Value>> {
        let values: Map<String, Value> =
            serde_yaml::from_str(&read_input(&self.values, "values").await?)
                .with_context(|| format!("Invalid values file {}", self.values.display()))?;
        let labels: BTreeMap<String, String> =
            serde_yaml::from_str(&read_input(&self.labels, "labels").await?)
                .with_context(|| format!("Invalid labels file {}", self.labels.display()))?;

        let processor =
            LabelSubstitutionProcessor::from_cluster_labels(&config.label_placeholder_prefix, &labels)
                .with_key_substitution(!self.no_keys);
        Ok(processor.process_map(&values)?)
    }
}
