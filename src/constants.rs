//! Constants shared across the preprocessing pipeline.
//!
//! The token wire format and the recursion bound live here so the codec,
//! both tree walkers, and the CLI agree on a single definition.

/// Maximum nesting depth either tree walker will descend into.
///
/// The root mapping is depth 0. A leaf sitting under
/// `MAX_TEMPLATE_RECURSION_DEPTH` nested keys is still processed; one more
/// level aborts the pass with a "maximum recursion depth" error.
pub const MAX_TEMPLATE_RECURSION_DEPTH: usize = 50;

/// Literal that opens every wrapped typed token.
pub const TYPED_TOKEN_PREFIX: &str = "fleetYamlTplTypeConv";

/// Separator between the segments of a wrapped token.
pub const TYPED_TOKEN_DELIMITER: char = ':';

/// Number of segments in a wrapped token: `prefix:nonce:type:value`.
pub const TYPED_TOKEN_SEGMENTS: usize = 4;

/// Default placeholder prefix for the legacy label substitution path.
///
/// A value of `global.fleet.clusterLabels.env` is replaced by the cluster's
/// `env` label.
pub const DEFAULT_LABEL_PLACEHOLDER_PREFIX: &str = "global.fleet.clusterLabels.";

/// Label and annotation key prefixes dropped before exposing cluster metadata
/// to templates.
pub const EXPORT_EXCLUDED_KEY_PREFIXES: &[&str] =
    &["kubectl.kubernetes.io/", "objectset.rio.cattle.io/"];

/// Environment variable overriding the global config file location.
pub const CONFIG_PATH_ENV: &str = "BUNDLEPREP_CONFIG";
