//! Minimal patch scripts between two immutable UI trees.
//!
//! [`diff`] walks an old and a new [`Node`] tree and returns a [`PatchScript`]:
//! operations keyed by tree-walk index, where the root is `0`, a node's first
//! child is its index plus one, and each later sibling follows the previous
//! sibling's subtree ([`ElementNode::count`] slots). Renderers must resolve
//! indices the same way ([`Node::indexed`]).
//!
//! Keyed children are matched by key and reordered through a single
//! [`PatchKind::Reordered`] operation on the parent. Hooks and destroyable
//! widgets in discarded subtrees are scheduled for teardown ahead of the operation
//! that discards them.
//!
//! Diffing is single-threaded and recursive; very deep trees can exhaust the
//! stack. Thunks cache their render output in place, so a thunk must not be
//! shared between concurrent diffs.
mod config;
mod diff_engine;
mod errors;
mod json;
mod lifecycle;
mod patch;
mod props;
mod renderer;
mod reorder;
mod types;

#[cfg(feature = "python")]
mod converters;
#[cfg(feature = "python")]
mod python;

pub use config::{DiffOptions, DuplicateKeyPolicy};
pub use diff_engine::{DiffEngine, diff, diff_with};
pub use errors::{DiffError, RenderError};
pub use json::{diff_json, node_from_json, tree_from_json};
pub use patch::{PatchKind, PatchOperation, PatchScript};
pub use props::{ATTRIBUTES, PropChange, PropsDiff, diff_props};
pub use renderer::{PropertyApplier, Renderer};
pub use reorder::{MoveInsert, MoveRemove, Moves, Reordered, duplicate_key, reorder};
pub use types::{ElementNode, Hook, HookValue, Node, PropValue, Props, RenderFn, TextNode, Thunk, Widget, WidgetNode};
