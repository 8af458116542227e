//! Recursion depth guard shared by the tree walkers.
//!
//! The guard is a small `Copy` value passed down each recursive call rather
//! than shared state, so walkers stay reentrant and can be tested alone.

use crate::constants::MAX_TEMPLATE_RECURSION_DEPTH;
use crate::core::{PreprocessError, Result};

/// Current depth and the bound it must not exceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthGuard {
    depth: usize,
    max: usize,
    walker: &'static str,
}

impl DepthGuard {
    /// Guard at the root of a tree, bounded by [`MAX_TEMPLATE_RECURSION_DEPTH`].
    ///
    /// `walker` names the processing path in the error message.
    #[must_use]
    pub const fn new(walker: &'static str) -> Self {
        Self::with_max(walker, MAX_TEMPLATE_RECURSION_DEPTH)
    }

    /// Guard at the root of a tree with a custom bound.
    #[must_use]
    pub const fn with_max(walker: &'static str, max: usize) -> Self {
        Self {
            depth: 0,
            max,
            walker,
        }
    }

    /// Depth of the node this guard belongs to. The root is 0.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// The bound.
    #[must_use]
    pub const fn max(&self) -> usize {
        self.max
    }

    /// Fail if this node lies deeper than the bound.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::RecursionDepthExceeded`].
    pub fn check(&self) -> Result<()> {
        if self.depth > self.max {
            return Err(PreprocessError::RecursionDepthExceeded {
                max: self.max,
                walker: self.walker,
            });
        }
        Ok(())
    }

    /// Guard for a child node.
    #[must_use]
    pub const fn descend(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..*self
        }
    }
}
