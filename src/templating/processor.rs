//! Template walk over a Helm values tree.
//!
//! [`TemplateValueProcessor`] renders every string leaf of a values tree with
//! [`LeafRenderer`] and then resolves the rendered text through the pass's
//! [`ConversionContext`], so a leaf written as
//! `"{{ Values.replicaCount | asInt }}"` ends up as the integer `2` instead
//! of the string `"2"`.
//!
//! Mapping keys are never rendered and non-string scalars are copied
//! unchanged. The walk is bounded by a [`DepthGuard`]; the root is depth 0.

use serde_json::{Map, Value};
use tera::Context as TeraContext;
use tracing::debug;

use super::context::{TemplateContext, to_tera_context};
use super::conversion::ConversionContext;
use super::guard::DepthGuard;
use super::renderer::LeafRenderer;
use super::utils::{child_index_path, child_key_path, display_path};
use crate::constants::MAX_TEMPLATE_RECURSION_DEPTH;
use crate::core::Result;

/// Name of this walk in recursion-depth errors.
const WALKER: &str = "template";

/// Renders and unwraps the string leaves of values trees for one pass.
pub struct TemplateValueProcessor {
    renderer: LeafRenderer,
    conversion: ConversionContext,
    context: TeraContext,
    max_depth: usize,
}

impl TemplateValueProcessor {
    /// Create a processor bound to `conversion` and rendering against `data`.
    ///
    /// # Errors
    ///
    /// Fails if `data` cannot be turned into a rendering context.
    pub fn new(conversion: ConversionContext, data: &TemplateContext) -> Result<Self> {
        Ok(Self::with_context(conversion, data.to_tera_context()?))
    }

    /// Create a processor rendering against an arbitrary mapping.
    ///
    /// # Errors
    ///
    /// Fails if `data` is not a mapping.
    pub fn from_value(conversion: ConversionContext, data: &Value) -> Result<Self> {
        Ok(Self::with_context(conversion, to_tera_context(data)?))
    }

    fn with_context(conversion: ConversionContext, context: TeraContext) -> Self {
        Self {
            renderer: LeafRenderer::new(&conversion),
            conversion,
            context,
            max_depth: MAX_TEMPLATE_RECURSION_DEPTH,
        }
    }

    /// Override the nesting bound.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The conversion context tokens are checked against.
    #[must_use]
    pub fn conversion(&self) -> &ConversionContext {
        &self.conversion
    }

    /// Process a whole tree, returning a new one.
    ///
    /// # Errors
    ///
    /// The first failing leaf aborts the walk. Leaf failures are located with
    /// [`PreprocessError::at`](crate::core::PreprocessError::at); exceeding the
    /// nesting bound is reported as is.
    pub fn process(&mut self, value: &Value) -> Result<Value> {
        let guard = DepthGuard::with_max(WALKER, self.max_depth);
        self.walk(value, guard, "")
    }

    /// Process a values mapping, returning a new one.
    ///
    /// # Errors
    ///
    /// See [`process`](Self::process).
    pub fn process_map(&mut self, values: &Map<String, Value>) -> Result<Map<String, Value>> {
        let guard = DepthGuard::with_max(WALKER, self.max_depth);
        self.walk_map(values, guard, "")
    }

    fn walk(&mut self, value: &Value, guard: DepthGuard, path: &str) -> Result<Value> {
        guard.check()?;

        match value {
            Value::Object(map) => self.walk_map(map, guard, path).map(Value::Object),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(self.walk(item, guard.descend(), &child_index_path(path, i))?);
                }
                Ok(Value::Array(out))
            }
            Value::String(template) => self.render_leaf(template, path),
            other => Ok(other.clone()),
        }
    }

    fn walk_map(
        &mut self,
        map: &Map<String, Value>,
        guard: DepthGuard,
        path: &str,
    ) -> Result<Map<String, Value>> {
        guard.check()?;

        let mut out = Map::with_capacity(map.len());
        for (key, child) in map {
            let processed = self.walk(child, guard.descend(), &child_key_path(path, key))?;
            out.insert(key.clone(), processed);
        }
        Ok(out)
    }

    fn render_leaf(&mut self, template: &str, path: &str) -> Result<Value> {
        let rendered = self
            .renderer
            .render(template, &self.context)
            .map_err(|e| e.at(display_path(path)))?;
        let value = self.conversion.unwrap(&rendered).map_err(|e| e.at(display_path(path)))?;

        if rendered != template {
            debug!("Rendered value at '{}'", display_path(path));
        }
        Ok(value)
    }
}

/// Process `values` against `data` with a fresh conversion context.
///
/// # Errors
///
/// See [`TemplateValueProcessor::process`].
pub fn process_template_values(
    values: &Map<String, Value>,
    data: &TemplateContext,
) -> Result<Map<String, Value>> {
    TemplateValueProcessor::new(ConversionContext::new(), data)?.process_map(values)
}
