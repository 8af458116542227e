//! Data context exposed to value templates.
//!
//! The field names are the surface bundle authors write against and must not
//! change:
//!
//! | variable             | content                                   |
//! |----------------------|-------------------------------------------|
//! | `ClusterName`        | name of the target cluster                |
//! | `ClusterNamespace`   | namespace of the target cluster object    |
//! | `ClusterLabels`      | cluster labels, cleaned for export        |
//! | `ClusterAnnotations` | cluster annotations, cleaned for export   |
//! | `Values`             | merged bundle and cluster template values |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tera::Context as TeraContext;

use crate::core::{PreprocessError, Result};

/// Variables available to every templated leaf of one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateContext {
    pub cluster_name: String,
    pub cluster_namespace: String,
    pub cluster_labels: BTreeMap<String, String>,
    pub cluster_annotations: BTreeMap<String, String>,
    pub values: Map<String, Value>,
}

impl TemplateContext {
    /// Convert into a Tera rendering context.
    ///
    /// # Errors
    ///
    /// Fails only if serialization produces something other than a mapping,
    /// which a struct never does.
    pub fn to_tera_context(&self) -> Result<TeraContext> {
        to_tera_context(self)
    }
}

/// Build a Tera context from any serializable mapping.
///
/// # Errors
///
/// Returns [`PreprocessError::Template`] if `data` does not serialize to a
/// mapping.
pub fn to_tera_context<T: Serialize + ?Sized>(data: &T) -> Result<TeraContext> {
    TeraContext::from_serialize(data).map_err(|e| PreprocessError::Template {
        template: String::new(),
        message: format!("invalid template data context: {e}"),
        suggestions: Vec::new(),
    })
}
