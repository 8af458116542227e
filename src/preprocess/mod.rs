//! Preprocessing of a bundle's Helm values for one target cluster.
//!
//! [`Preprocessor::preprocess_helm_values`] is called once per
//! (bundle, cluster) pair before the values are handed to Helm:
//!
//! 1. Nothing happens when the bundle has no `helm` section.
//! 2. Literal label placeholders (`global.fleet.clusterLabels.<label>`) are
//!    substituted in values and keys.
//! 3. Unless disabled, every string leaf is rendered against the cluster's
//!    data context with a fresh [`ConversionContext`] and unwrapped to its
//!    native type.
//! 4. The result replaces `helm.values`. A failure leaves the options
//!    exactly as they were.
//!
//! Nothing is cached or retried; an error fails the deployment attempt for
//! that cluster.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::constants::{DEFAULT_LABEL_PLACEHOLDER_PREFIX, EXPORT_EXCLUDED_KEY_PREFIXES};
use crate::core::Result;
use crate::models::{BundleDeploymentOptions, Cluster, HelmOptions};
use crate::templating::{
    ConversionContext, LabelSubstitutionProcessor, TemplateContext, TemplateValueProcessor,
    deep_merge_json,
};

/// Settings that apply to every pass, usually taken from the global config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessOptions {
    /// Skip template rendering even when the bundle enables it.
    pub force_disable_preprocess: bool,
    /// Prefix of the literal label placeholders.
    pub label_placeholder_prefix: String,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            force_disable_preprocess: false,
            label_placeholder_prefix: DEFAULT_LABEL_PLACEHOLDER_PREFIX.to_string(),
        }
    }
}

/// Runs preprocessing passes with fixed [`PreprocessOptions`].
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    options: PreprocessOptions,
}

impl Preprocessor {
    #[must_use]
    pub fn new(options: PreprocessOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &PreprocessOptions {
        &self.options
    }

    /// Rewrite `options.helm.values` for `cluster`.
    ///
    /// # Errors
    ///
    /// Any walker failure aborts the pass; `options` is not modified.
    pub fn preprocess_helm_values(
        &self,
        options: &mut BundleDeploymentOptions,
        cluster: &Cluster,
    ) -> Result<()> {
        let Some(helm) = options.helm.as_ref() else {
            debug!("Bundle has no helm section, nothing to preprocess");
            return Ok(());
        };

        let cluster_name = &cluster.metadata.name;
        info!("Preprocessing helm values for cluster '{cluster_name}'");

        let processed = self.process(helm, cluster).inspect_err(|e| {
            warn!("Preprocessing helm values for cluster '{cluster_name}' failed: {e}");
        })?;

        if let Some(helm) = options.helm.as_mut() {
            helm.values = Some(processed);
        }
        info!("Preprocessed helm values for cluster '{cluster_name}'");
        Ok(())
    }

    fn process(&self, helm: &HelmOptions, cluster: &Cluster) -> Result<Map<String, Value>> {
        let values = helm.values.clone().unwrap_or_default();

        let labels = clean_for_export(&cluster.metadata.labels);
        let substituted = LabelSubstitutionProcessor::from_cluster_labels(
            &self.options.label_placeholder_prefix,
            &labels,
        )
        .process_map(&values)?;

        if helm.disable_preprocess || self.options.force_disable_preprocess {
            debug!("Template preprocessing disabled, keeping values verbatim");
            return Ok(substituted);
        }

        let data = build_template_context(helm, cluster);
        TemplateValueProcessor::new(ConversionContext::new(), &data)?.process_map(&substituted)
    }
}

/// Assemble the data context for `cluster`.
///
/// `Values` is the bundle's template values with the cluster's merged over
/// them.
#[must_use]
pub fn build_template_context(helm: &HelmOptions, cluster: &Cluster) -> TemplateContext {
    let bundle_values = Value::Object(helm.template_values.clone().unwrap_or_default());
    let cluster_values = Value::Object(cluster.spec.template_values.clone().unwrap_or_default());

    let values = match deep_merge_json(bundle_values, &cluster_values) {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    TemplateContext {
        cluster_name: cluster.metadata.name.clone(),
        cluster_namespace: cluster.metadata.namespace.clone(),
        cluster_labels: clean_for_export(&cluster.metadata.labels),
        cluster_annotations: clean_for_export(&cluster.metadata.annotations),
        values,
    }
}

/// Drop labels or annotations managed by tooling rather than users.
#[must_use]
pub fn clean_for_export(entries: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    entries
        .iter()
        .filter(|(key, _)| {
            !EXPORT_EXCLUDED_KEY_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Preprocess with default [`PreprocessOptions`].
///
/// # Errors
///
/// See [`Preprocessor::preprocess_helm_values`].
pub fn preprocess_helm_values(
    options: &mut BundleDeploymentOptions,
    cluster: &Cluster,
) -> Result<()> {
    Preprocessor::default().preprocess_helm_values(options, cluster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PreprocessError;
    use serde_json::json;
    use std::fmt::Write;

    const CLUSTER_YAML: &str = r#"
metadata:
  name: test-cluster
  namespace: fleet-default
  labels:
    name: local
    envType: dev
    testLabel: from-label
    objectset.rio.cattle.io/hash: abc123
  annotations:
    kubectl.kubernetes.io/last-applied-configuration: "{}"
    owner: team-a
spec:
  templateValues:
    someKey: cluster-value
    replicas: 3
"#;

    fn cluster() -> Cluster {
        Cluster::from_yaml(CLUSTER_YAML).unwrap()
    }

    fn bundle(yaml: &str) -> BundleDeploymentOptions {
        BundleDeploymentOptions::from_yaml(yaml).unwrap()
    }

    fn values(options: &BundleDeploymentOptions) -> Value {
        Value::Object(options.helm.as_ref().unwrap().values.clone().unwrap())
    }

    #[test]
    fn test_disable_preprocess_enabled() {
        let mut options = bundle(
            r#"
namespace: default
helm:
  disablePreprocess: true
  releaseName: labels
  values:
    clusterName: "{{ ClusterName }}"
    clusterContext: "{{ Values.someKey }}"
    templateFn: "{{ ClusterLabels | index(key='testLabel') }}"
    syntaxError: "{{ non_existent_function() }}"
"#,
        );

        preprocess_helm_values(&mut options, &cluster()).unwrap();
        assert_eq!(
            values(&options),
            json!({
                "clusterName": "{{ ClusterName }}",
                "clusterContext": "{{ Values.someKey }}",
                "templateFn": "{{ ClusterLabels | index(key='testLabel') }}",
                "syntaxError": "{{ non_existent_function() }}"
            })
        );
    }

    #[test]
    fn test_disable_preprocess_disabled_or_missing() {
        for flag in ["\n  disablePreprocess: false", ""] {
            let mut options = bundle(&format!(
                "namespace: default\nhelm:{flag}\n  releaseName: labels\n  values:\n    clusterName: \"{{{{ ClusterName }}}}\"\n"
            ));

            preprocess_helm_values(&mut options, &cluster()).unwrap();
            assert_eq!(values(&options), json!({"clusterName": "test-cluster"}));
        }
    }

    #[test]
    fn test_force_disable_overrides_bundle() {
        let mut options = bundle(
            "helm:\n  values:\n    name: \"{{ ClusterName }}\"\n    label: global.fleet.clusterLabels.envType\n",
        );
        let preprocessor = Preprocessor::new(PreprocessOptions {
            force_disable_preprocess: true,
            ..PreprocessOptions::default()
        });

        preprocessor.preprocess_helm_values(&mut options, &cluster()).unwrap();
        assert_eq!(
            values(&options),
            json!({"name": "{{ ClusterName }}", "label": "dev"})
        );
    }

    #[test]
    fn test_recursion_depth_for_templating() {
        let mut yaml = String::from("namespace: default\nhelm:\n  releaseName: labels\n  values:");
        for i in 1..=crate::constants::MAX_TEMPLATE_RECURSION_DEPTH + 1 {
            write!(yaml, "\n  {}\"{i}\":", " ".repeat(i)).unwrap();
        }
        yaml.push_str(" final_value");

        let mut options = bundle(&yaml);
        let err = preprocess_helm_values(&mut options, &cluster()).unwrap_err();
        assert!(
            err.to_string().starts_with("maximum recursion depth"),
            "expected error to be about recursion, got: {err}"
        );
    }

    #[test]
    fn test_labels_then_templates_with_merged_values() {
        let mut options = bundle(
            r#"
helm:
  templateValues:
    someKey: bundle-value
    onlyBundle: kept
    replicas: 1
  values:
    env: global.fleet.clusterLabels.envType
    global.fleet.clusterLabels.name: key-substituted
    replicas: "{{ Values.replicas | asInt }}"
    someKey: "{{ Values.someKey }}-{{ Values.onlyBundle }}"
    annotations: "{{ ClusterAnnotations | json_encode() }}"
    labelCount: "{{ ClusterLabels | length }}"
    ns: "{{ ClusterNamespace }}"
"#,
        );

        preprocess_helm_values(&mut options, &cluster()).unwrap();
        assert_eq!(
            values(&options),
            json!({
                "env": "dev",
                "local": "key-substituted",
                "replicas": 3,
                "someKey": "cluster-value-kept",
                "annotations": r#"{"owner":"team-a"}"#,
                "labelCount": "3",
                "ns": "fleet-default"
            })
        );
    }

    #[test]
    fn test_failure_leaves_options_untouched() {
        let mut options = bundle(
            "helm:\n  values:\n    ok: \"{{ ClusterName }}\"\n    bad: \"{{ Values.replicas | asint }}\"\n",
        );
        let before = options.clone();

        let err = preprocess_helm_values(&mut options, &cluster()).unwrap_err();
        assert_eq!(err.path(), Some("bad"));
        assert!(matches!(err.innermost(), PreprocessError::Template { .. }));
        assert_eq!(options, before);
    }

    #[test]
    fn test_missing_helm_or_values() {
        let mut options = bundle("namespace: default");
        preprocess_helm_values(&mut options, &cluster()).unwrap();
        assert!(options.helm.is_none());

        let mut options = bundle("helm:\n  releaseName: empty\n");
        preprocess_helm_values(&mut options, &cluster()).unwrap();
        assert_eq!(values(&options), json!({}));
    }

    #[test]
    fn test_clean_for_export() {
        let cleaned = clean_for_export(&cluster().metadata.labels);
        assert!(!cleaned.contains_key("objectset.rio.cattle.io/hash"));
        assert_eq!(cleaned.len(), 3);

        let context = build_template_context(&HelmOptions::default(), &cluster());
        assert_eq!(
            context.cluster_annotations,
            BTreeMap::from([("owner".to_string(), "team-a".to_string())])
        );
        assert_eq!(context.values["someKey"], json!("cluster-value"));
    }
}
