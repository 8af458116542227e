//! Test fixtures for clusters and bundles
//!
//! Each fixture holds YAML content and can write itself into a directory.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Test fixture for cluster YAML files
#[derive(Clone, Debug)]
pub struct ClusterFixture {
    pub content: String,
    pub name: String,
}

impl ClusterFixture {
    /// Cluster `test-cluster` with user labels, tool-managed metadata and
    /// template values
    pub fn basic() -> Self {
        Self {
            name: "basic".to_string(),
            content: r#"
apiVersion: fleet.cattle.io/v1alpha1
kind: Cluster
metadata:
  name: test-cluster
  namespace: fleet-default
  labels:
    name: local
    envType: dev
    really-long-label-name-with-many-many-characters-in-it: foobar
    objectset.rio.cattle.io/hash: 0123abcd
  annotations:
    owner: team-a
    kubectl.kubernetes.io/last-applied-configuration: "{}"
spec:
  templateValues:
    replicaCount: 2
    ratio: "0.544"
    monitoring: "true"
"#
            .trim()
            .to_string(),
        }
    }

    /// Cluster with only a name
    pub fn minimal(name: &str) -> Self {
        Self {
            name: "minimal".to_string(),
            content: format!("metadata:\n  name: {name}\n"),
        }
    }

    /// Write to `cluster.yaml` in `dir`
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join("cluster.yaml");
        fs::write(&path, &self.content)
            .with_context(|| format!("Failed to write cluster fixture {}", self.name))?;
        Ok(path)
    }
}

/// Test fixture for bundle deployment option YAML files
#[derive(Clone, Debug)]
pub struct BundleFixture {
    pub content: String,
    pub name: String,
}

impl BundleFixture {
    /// Bundle exercising every conversion filter and the label path
    pub fn typed() -> Self {
        Self {
            name: "typed".to_string(),
            content: r#"
namespace: default
helm:
  releaseName: typed
  values:
    replicaCount: "{{ Values.replicaCount | asInt }}"
    ratio: "{{ Values.ratio | asFloat }}"
    monitoring: "{{ Values.monitoring | asBool }}"
    storageClass: "{{ Values | index(key='storageClass') | asNullable }}"
    clusterName: "{{ ClusterName }}"
    env: global.fleet.clusterLabels.envType
    customStruct:
      - "{{ ClusterLabels.name }}-{{ ClusterName | upper }}"
      - element2: "{{ ClusterLabels.envType | upper }}_test"
"#
            .trim()
            .to_string(),
        }
    }

    /// Bundle whose values are a single templated leaf
    pub fn with_values(values_yaml: &str, disable_preprocess: bool) -> Self {
        let mut content = format!(
            "namespace: default\nhelm:\n  releaseName: custom\n  disablePreprocess: {disable_preprocess}\n  values:\n"
        );
        for line in values_yaml.lines() {
            content.push_str("    ");
            content.push_str(line);
            content.push('\n');
        }
        Self {
            name: "custom".to_string(),
            content,
        }
    }

    /// Bundle whose values nest `depth` mappings deep
    pub fn nested(depth: usize) -> Self {
        Self {
            name: format!("nested-{depth}"),
            content: format!(
                "namespace: default\nhelm:\n  releaseName: nested\n  values:{}",
                nested_values_yaml(depth, 4)
            ),
        }
    }

    /// Write to `fleet.yaml` in `dir`
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join("fleet.yaml");
        fs::write(&path, &self.content)
            .with_context(|| format!("Failed to write bundle fixture {}", self.name))?;
        Ok(path)
    }
}

/// YAML for `depth` nested mappings ending in the leaf `final_value`.
///
/// The output starts with a newline and is indented by `indent` spaces so it
/// can be appended after a `values:` key.
pub fn nested_values_yaml(depth: usize, indent: usize) -> String {
    let mut yaml = String::new();
    for level in 1..=depth {
        yaml.push('\n');
        yaml.push_str(&" ".repeat(indent + 2 * (level - 1)));
        yaml.push_str(&format!("\"{level}\":"));
    }
    yaml.push_str(" final_value\n");
    yaml
}
