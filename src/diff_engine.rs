//! Recursive tree walker producing the index-addressed patch script
use crate::config::{DiffOptions, DuplicateKeyPolicy};
use crate::errors::DiffError;
use crate::patch::{PatchOperation, PatchScript};
use crate::props::diff_props;
use crate::reorder::{duplicate_key, reorder};
use crate::types::{ElementNode, Node};
use log::debug;

/// Diff `old` against `new` with default options.
///
/// Either side may be `None`: `(None, Some)` mounts, `(Some, None)` unmounts.
/// Thunks on either side are rendered (and cached) during the walk; a render
/// failure aborts the call.
pub fn diff<'a>(old: Option<&'a Node>, new: Option<&'a Node>) -> Result<PatchScript<'a>, DiffError> {
    diff_with(old, new, DiffOptions::default())
}

pub fn diff_with<'a>(
    old: Option<&'a Node>,
    new: Option<&'a Node>,
    options: DiffOptions,
) -> Result<PatchScript<'a>, DiffError> {
    debug!(
        "DiffEngine: diff start old_slots={:?} new_slots={:?} options={:?}",
        old.map(|n| n.count() + 1),
        new.map(|n| n.count() + 1),
        options
    );
    let script = DiffEngine::new(old, options).run(old, new)?;
    debug!(
        "DiffEngine: diff done indices={} operations={}",
        script.len(),
        script.operation_count()
    );
    Ok(script)
}

/// Owns the script under construction. Each `diff` call uses a fresh engine;
/// thunk sub-scripts are built by nested engines.
pub struct DiffEngine<'a> {
    options: DiffOptions,
    pub(crate) script: PatchScript<'a>,
}

impl<'a> DiffEngine<'a> {
    pub fn new(root: Option<&'a Node>, options: DiffOptions) -> Self {
        DiffEngine {
            options,
            script: PatchScript::new(root),
        }
    }

    pub fn run(mut self, old: Option<&'a Node>, new: Option<&'a Node>) -> Result<PatchScript<'a>, DiffError> {
        self.walk(old, new, 0)?;
        Ok(self.script)
    }

    pub fn finish(self) -> PatchScript<'a> {
        self.script
    }

    fn walk(&mut self, a: Option<&'a Node>, b: Option<&'a Node>, index: usize) -> Result<(), DiffError> {
        if let (Some(x), Some(y)) = (a, b) {
            if Node::same(x, y) {
                return Ok(());
            }
        }

        match (a, b) {
            (None, None) => {}
            (Some(Node::Thunk(_)), _) | (_, Some(Node::Thunk(_))) => self.thunks(a, b, index)?,
            (Some(old), None) => {
                // A widget gets exactly one remove; teardown would add a second.
                if !old.is_widget() {
                    self.clear_state(old, index)?;
                }
                self.script.push(index, PatchOperation::Removed { old });
            }
            (Some(old @ Node::Element(x)), Some(Node::Element(y))) if same_element(x, y) => {
                if let Some(props) = diff_props(x.properties(), y.properties()) {
                    self.script.push(index, PatchOperation::PropsChanged { node: old, props });
                }
                self.diff_children(old, x, y, index)?;
            }
            (Some(old @ Node::Text(x)), Some(new @ Node::Text(y))) => {
                if x.text() != y.text() {
                    self.script.push(index, PatchOperation::TextChanged { old, new });
                }
            }
            (_, Some(new @ (Node::Element(_) | Node::Text(_)))) => {
                if let Some(old) = a {
                    self.clear_state(old, index)?;
                }
                self.script.push(index, PatchOperation::Replaced { old: a, new });
            }
            (_, Some(new @ Node::Widget(_))) => {
                if let Some(old) = a.filter(|old| !old.is_widget()) {
                    self.clear_state(old, index)?;
                }
                self.script.push(index, PatchOperation::WidgetOp { old: a, new });
            }
        }

        Ok(())
    }

    /// Renders both sides (new first, handed the old node for reuse) and
    /// diffs the results into a sub-script.
    pub(crate) fn thunks(&mut self, a: Option<&'a Node>, b: Option<&'a Node>, index: usize) -> Result<(), DiffError> {
        let rendered_b = match b {
            Some(Node::Thunk(thunk)) => Some(thunk.render(a)?),
            other => other,
        };
        let rendered_a = match a {
            Some(Node::Thunk(thunk)) => Some(thunk.render(None)?),
            other => other,
        };

        let script = DiffEngine::new(rendered_a, self.options).run(rendered_a, rendered_b)?;
        if !script.is_empty() {
            self.script.push(index, PatchOperation::ThunkDiff { script });
        }
        Ok(())
    }

    fn diff_children(
        &mut self,
        parent: &'a Node,
        a: &'a ElementNode,
        b: &'a ElementNode,
        index: usize,
    ) -> Result<(), DiffError> {
        if self.options.duplicate_keys == DuplicateKeyPolicy::Reject {
            if let Some(key) = duplicate_key(a.children()).or_else(|| duplicate_key(b.children())) {
                return Err(DiffError::DuplicateKey { key: key.to_string() });
            }
        }

        let a_children = a.children();
        let ordered = reorder(a_children, b.children());
        let len = a_children.len().max(ordered.children.len());

        let mut child_index = index;
        for i in 0..len {
            let left = a_children.get(i);
            let right = ordered.children.get(i).copied().flatten();
            child_index += 1;

            match left {
                Some(left) => {
                    self.walk(Some(left), right, child_index)?;
                    child_index += left.count();
                }
                None => {
                    if let Some(right) = right {
                        self.script.push(index, PatchOperation::Inserted { new: right });
                    }
                }
            }
        }

        if let Some(moves) = ordered.moves {
            self.script.push(index, PatchOperation::Reordered { node: parent, moves });
        }
        Ok(())
    }
}

fn same_element(a: &ElementNode, b: &ElementNode) -> bool {
    a.tag() == b.tag() && a.namespace() == b.namespace() && a.key() == b.key()
}
