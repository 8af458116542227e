//! Type-preserving templating for Helm values trees.
//!
//! This module renders the string leaves of a values tree against per-cluster
//! data while keeping the native types Helm charts expect. It is built from
//! small pieces that each do one thing:
//!
//! - [`token`]: the `prefix:nonce:type:payload` codec ([`TypedToken`],
//!   [`ValueType`])
//! - [`conversion`]: the per-pass [`ConversionContext`] owning the nonce and
//!   the `asInt`/`asFloat`/`asBool`/`asNullable` helpers
//! - [`filters`]: the helpers exposed as Tera filters, plus `index`
//! - [`renderer`]: single-leaf rendering with Tera and error suggestions
//! - [`processor`]: the recursive template walk ([`TemplateValueProcessor`])
//! - [`labels`]: the literal placeholder walk ([`LabelSubstitutionProcessor`])
//! - [`guard`]: the recursion bound shared by both walks
//! - [`context`]: the data context bundle authors write against
//!
//! # Template Context
//!
//! Templates are rendered with these top-level variables:
//! - `ClusterName`, `ClusterNamespace`: identity of the target cluster
//! - `ClusterLabels`, `ClusterAnnotations`: cluster metadata, cleaned for export
//! - `Values`: bundle-level template values merged with the cluster's own
//!
//! # Examples
//!
//! ```yaml
//! replicaCount: "{{ Values.replicaCount | asInt }}"
//! ingressHost: "{{ ClusterName }}.{{ ClusterLabels.domain }}"
//! monitoring: "{{ ClusterLabels | index(key='monitoring') | asBool }}"
//! storageClass: "{{ Values | index(key='storageClass') | asNullable }}"
//! ```
//!
//! Without a conversion filter every rendered leaf stays a string. With one,
//! the leaf is replaced by the native value after rendering:
//!
//! ```rust
//! use bundleprep::templating::{ConversionContext, TemplateContext, TemplateValueProcessor};
//! use serde_json::json;
//!
//! # fn main() -> bundleprep::core::Result<()> {
//! let data = TemplateContext {
//!     values: json!({ "replicaCount": 2 }).as_object().cloned().unwrap_or_default(),
//!     ..TemplateContext::default()
//! };
//! let mut processor = TemplateValueProcessor::new(ConversionContext::new(), &data)?;
//!
//! let out = processor.process(&json!({ "replicas": "{{ Values.replicaCount | asInt }}" }))?;
//! assert_eq!(out, json!({ "replicas": 2 }));
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod conversion;
pub mod filters;
pub mod guard;
pub mod labels;
pub mod processor;
pub mod renderer;
pub mod token;
pub mod utils;

pub use context::TemplateContext;
pub use conversion::{ConversionContext, canonical_string};
pub use guard::DepthGuard;
pub use labels::{LabelSubstitutionProcessor, process_label_values};
pub use processor::{TemplateValueProcessor, process_template_values};
pub use renderer::LeafRenderer;
pub use token::{TypedToken, ValueType};
pub use utils::deep_merge_json;
