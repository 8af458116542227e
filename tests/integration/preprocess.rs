//! Orchestrator tests on complete bundle and cluster documents.

use bundleprep::constants::MAX_TEMPLATE_RECURSION_DEPTH;
use bundleprep::core::PreprocessError;
use bundleprep::models::{BundleDeploymentOptions, Cluster};
use bundleprep::preprocess::{PreprocessOptions, Preprocessor, preprocess_helm_values};
use bundleprep::test_utils::{BundleFixture, ClusterFixture, init_test_logging};
use serde_json::{Value, json};

fn cluster() -> Cluster {
    Cluster::from_yaml(&ClusterFixture::basic().content).unwrap()
}

fn values_of(options: &BundleDeploymentOptions) -> Value {
    Value::Object(options.helm.as_ref().unwrap().values.clone().unwrap())
}

#[test]
fn test_typed_bundle_end_to_end() {
    init_test_logging(None);
    let mut options = BundleDeploymentOptions::from_yaml(&BundleFixture::typed().content).unwrap();

    preprocess_helm_values(&mut options, &cluster()).unwrap();

    assert_eq!(
        values_of(&options),
        json!({
            "replicaCount": 2,
            "ratio": 0.544,
            "monitoring": true,
            "storageClass": null,
            "clusterName": "test-cluster",
            "env": "dev",
            "customStruct": [
                "local-TEST-CLUSTER",
                { "element2": "DEV_test" }
            ]
        })
    );
}

#[test]
fn test_integer_is_not_a_string() {
    let mut options = BundleDeploymentOptions::from_yaml(
        &BundleFixture::with_values("replicas: \"{{ Values.replicaCount | asInt }}\"", false)
            .content,
    )
    .unwrap();

    preprocess_helm_values(&mut options, &cluster()).unwrap();
    let values = values_of(&options);
    assert!(values["replicas"].is_i64(), "got {}", values["replicas"]);
}

#[test]
fn test_disabled_bundle_ships_verbatim() {
    let raw = "clusterName: \"{{ ClusterName }}\"\nbroken: \"{{ ClusterName \"";
    let mut options =
        BundleDeploymentOptions::from_yaml(&BundleFixture::with_values(raw, true).content).unwrap();

    preprocess_helm_values(&mut options, &cluster()).unwrap();
    assert_eq!(
        values_of(&options),
        json!({"clusterName": "{{ ClusterName }}", "broken": "{{ ClusterName "})
    );
}

#[test]
fn test_depth_limit() {
    let mut ok = BundleDeploymentOptions::from_yaml(
        &BundleFixture::nested(MAX_TEMPLATE_RECURSION_DEPTH).content,
    )
    .unwrap();
    preprocess_helm_values(&mut ok, &cluster()).unwrap();

    let mut too_deep = BundleDeploymentOptions::from_yaml(
        &BundleFixture::nested(MAX_TEMPLATE_RECURSION_DEPTH + 1).content,
    )
    .unwrap();
    let before = too_deep.clone();
    let err = preprocess_helm_values(&mut too_deep, &cluster()).unwrap_err();

    assert!(err.to_string().starts_with("maximum recursion depth"), "got: {err}");
    assert_eq!(too_deep, before);
}

#[test]
fn test_hand_written_token_is_rejected() {
    let mut options = BundleDeploymentOptions::from_yaml(
        &BundleFixture::with_values(
            "list:\n  - fine\n  - nested:\n      token: fleetYamlTplTypeConv:0000:int:5",
            false,
        )
        .content,
    )
    .unwrap();

    let err = preprocess_helm_values(&mut options, &cluster()).unwrap_err();
    assert_eq!(err.path(), Some("list[1].nested.token"));
    assert!(matches!(err.innermost(), PreprocessError::NonceMismatch { .. }));
}

#[test]
fn test_unsupported_conversion_is_reported() {
    let mut options = BundleDeploymentOptions::from_yaml(
        &BundleFixture::with_values("n: \"{{ ClusterLabels | asInt }}\"", false).content,
    )
    .unwrap();

    let err = preprocess_helm_values(&mut options, &cluster()).unwrap_err();
    assert_eq!(err.path(), Some("n"));
    assert!(matches!(err.innermost(), PreprocessError::UnsupportedConversion { .. }));
}

#[test]
fn test_custom_placeholder_prefix() {
    let mut options = BundleDeploymentOptions::from_yaml(
        &BundleFixture::with_values("a: labels.envType\nb: global.fleet.clusterLabels.envType", false)
            .content,
    )
    .unwrap();
    let preprocessor = Preprocessor::new(PreprocessOptions {
        label_placeholder_prefix: "labels.".to_string(),
        ..PreprocessOptions::default()
    });

    preprocessor.preprocess_helm_values(&mut options, &cluster()).unwrap();
    assert_eq!(
        values_of(&options),
        json!({"a": "dev", "b": "global.fleet.clusterLabels.envType"})
    );
}

#[test]
fn test_each_pass_uses_a_fresh_nonce() {
    let bundle = BundleFixture::with_values("r: \"{{ Values.replicaCount | asInt }}\"", false);
    let cluster = cluster();

    let results: Vec<Value> = (0..3)
        .map(|_| {
            let mut options = BundleDeploymentOptions::from_yaml(&bundle.content).unwrap();
            preprocess_helm_values(&mut options, &cluster).unwrap();
            values_of(&options)
        })
        .collect();

    assert!(results.iter().all(|v| v == &json!({"r": 2})));
}
