//! Cluster and bundle models consumed by the preprocessing pass.
//!
//! Only the fields preprocessing reads are modelled; every other field of the
//! Kubernetes objects is ignored on parse. Both types are read from YAML.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Object metadata of a cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

/// Cluster spec fields relevant to preprocessing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterSpec {
    /// Cluster-level values, merged over the bundle's template values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_values: Option<Map<String, Value>>,
}

/// A downstream cluster a bundle is deployed to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cluster {
    pub metadata: ObjectMeta,
    pub spec: ClusterSpec,
}

impl Cluster {
    /// Parse a cluster from YAML.
    ///
    /// # Errors
    ///
    /// Fails on invalid YAML or mistyped fields.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse cluster YAML")
    }
}

/// Helm section of a bundle's deployment options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HelmOptions {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub release_name: String,

    /// The values tree handed to Helm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Map<String, Value>>,

    /// Bundle-level values exposed to templates as `Values`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_values: Option<Map<String, Value>>,

    /// Ship `values` without template rendering.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disable_preprocess: bool,
}

/// Per-bundle deployment options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleDeploymentOptions {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub helm: Option<HelmOptions>,
}

impl BundleDeploymentOptions {
    /// Parse deployment options from YAML.
    ///
    /// # Errors
    ///
    /// Fails on invalid YAML or mistyped fields.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse bundle deployment options YAML")
    }
}
