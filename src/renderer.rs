//! Seams for the rendering side, which lives outside this crate.
//!
//! A renderer keeps whatever document or context it needs on `self`; nothing
//! here reaches for ambient global state.
use crate::patch::PatchScript;
use crate::props::PropsDiff;
use crate::types::{Node, Props};

/// Materializes trees and applies scripts to what it materialized.
///
/// `patch` must resolve every index to a handle before applying anything,
/// the same way [`Node::indexed`] numbers `script.root()`, then apply each
/// index's operations in order. A `Removed` followed by `Replaced` at the same
/// index is a widget teardown: release the widget and leave the node attached
/// for the swap.
pub trait Renderer {
    type Handle;
    type Error;

    fn render(&mut self, node: &Node) -> Result<Self::Handle, Self::Error>;

    /// Returns the new root handle, which differs from `root` when the root was replaced.
    fn patch(&mut self, root: Self::Handle, script: &PatchScript<'_>) -> Result<Self::Handle, Self::Error>;
}

/// Assigns property diffs to a rendered target, calling hook and unhook
/// callbacks as values come and go. `previous` is the full old mapping.
pub trait PropertyApplier {
    type Target;

    fn apply_properties(&mut self, target: &mut Self::Target, diff: &PropsDiff<'_>, previous: Option<&Props>);
}
