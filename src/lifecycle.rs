//! Teardown of external resources ahead of structural removal
use crate::diff_engine::DiffEngine;
use crate::errors::DiffError;
use crate::patch::PatchOperation;
use crate::props::{PropChange, PropsDiff};
use crate::types::Node;

#[derive(Clone, Copy)]
struct Teardown {
    hooks: bool,
    widgets: bool,
}

impl<'a> DiffEngine<'a> {
    /// Schedules `unhook` for every hook owned by `node` or its descendants.
    pub fn unhook(&mut self, node: &'a Node, index: usize) -> Result<(), DiffError> {
        self.teardown(node, index, Teardown { hooks: true, widgets: false })
    }

    /// Schedules a remove for every destroyable widget in the subtree, so the
    /// renderer has a rendered handle to call `destroy` with.
    pub fn destroy_widgets(&mut self, node: &'a Node, index: usize) -> Result<(), DiffError> {
        self.teardown(node, index, Teardown { hooks: false, widgets: true })
    }

    /// Both teardowns in a single walk. Every resource is released at most once.
    pub fn clear_state(&mut self, node: &'a Node, index: usize) -> Result<(), DiffError> {
        self.teardown(node, index, Teardown { hooks: true, widgets: true })
    }

    fn teardown(&mut self, node: &'a Node, index: usize, mode: Teardown) -> Result<(), DiffError> {
        match node {
            Node::Element(element) => {
                if mode.hooks && element.has_own_hooks() {
                    let props: PropsDiff<'a> = element
                        .hook_names()
                        .iter()
                        .map(|name| (name.as_str(), PropChange::Removed))
                        .collect();
                    self.script.push(index, PatchOperation::PropsChanged { node, props });
                }

                let descend = (mode.hooks && element.has_descendant_hooks())
                    || (mode.widgets && element.has_widgets())
                    || element.has_thunks();
                if descend {
                    let mut child_index = index;
                    for child in element.children() {
                        child_index += 1;
                        self.teardown(child, child_index, mode)?;
                        child_index += child.count();
                    }
                }
            }
            Node::Widget(widget) => {
                if mode.widgets && widget.destroyable() {
                    self.script.push(index, PatchOperation::Removed { old: node });
                }
            }
            // The thunk's removal sub-script tears down its rendered tree in full.
            Node::Thunk(_) => self.thunks(Some(node), None, index)?,
            Node::Text(_) => {}
        }
        Ok(())
    }
}
