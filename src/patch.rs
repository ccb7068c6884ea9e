//! Patch operations and the index-addressed script handed to the renderer
use crate::errors::DiffError;
use crate::props::PropsDiff;
use crate::reorder::Moves;
use crate::types::Node;
use log::trace;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Operation kinds with their stable wire codes. `None` (0) is never emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PatchKind {
    None,
    TextChanged,
    Replaced,
    WidgetOp,
    PropsChanged,
    Reordered,
    Inserted,
    Removed,
    ThunkDiff,
}

impl PatchKind {
    pub const ALL: [PatchKind; 9] = [
        PatchKind::None,
        PatchKind::TextChanged,
        PatchKind::Replaced,
        PatchKind::WidgetOp,
        PatchKind::PropsChanged,
        PatchKind::Reordered,
        PatchKind::Inserted,
        PatchKind::Removed,
        PatchKind::ThunkDiff,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PatchKind::None => "NONE",
            PatchKind::TextChanged => "TEXT_CHANGED",
            PatchKind::Replaced => "REPLACED",
            PatchKind::WidgetOp => "WIDGET",
            PatchKind::PropsChanged => "PROPS_CHANGED",
            PatchKind::Reordered => "REORDERED",
            PatchKind::Inserted => "INSERTED",
            PatchKind::Removed => "REMOVED",
            PatchKind::ThunkDiff => "THUNK",
        }
    }
}

impl fmt::Display for PatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind")]
pub enum PatchOperation<'a> {
    /// Text content of `old` becomes that of `new`.
    TextChanged { old: &'a Node, new: &'a Node },
    /// `old` is absent when mounting into an empty root.
    Replaced { old: Option<&'a Node>, new: &'a Node },
    /// The renderer decides between updating and recreating.
    WidgetOp { old: Option<&'a Node>, new: &'a Node },
    PropsChanged { node: &'a Node, props: PropsDiff<'a> },
    /// Targets the parent; applied after its positional child patches.
    Reordered { node: &'a Node, moves: Moves<'a> },
    /// Appended as the last child of the node at this index.
    Inserted { new: &'a Node },
    Removed { old: &'a Node },
    /// Sub-script rooted at the thunk's rendered output.
    ThunkDiff { script: PatchScript<'a> },
}

impl<'a> PatchOperation<'a> {
    pub fn kind(&self) -> PatchKind {
        match self {
            PatchOperation::TextChanged { .. } => PatchKind::TextChanged,
            PatchOperation::Replaced { .. } => PatchKind::Replaced,
            PatchOperation::WidgetOp { .. } => PatchKind::WidgetOp,
            PatchOperation::PropsChanged { .. } => PatchKind::PropsChanged,
            PatchOperation::Reordered { .. } => PatchKind::Reordered,
            PatchOperation::Inserted { .. } => PatchKind::Inserted,
            PatchOperation::Removed { .. } => PatchKind::Removed,
            PatchOperation::ThunkDiff { .. } => PatchKind::ThunkDiff,
        }
    }

    /// The old node this operation refers to, if any.
    pub fn old(&self) -> Option<&'a Node> {
        match self {
            PatchOperation::TextChanged { old, .. } => Some(*old),
            PatchOperation::Replaced { old, .. } | PatchOperation::WidgetOp { old, .. } => *old,
            PatchOperation::PropsChanged { node, .. } | PatchOperation::Reordered { node, .. } => Some(*node),
            PatchOperation::Removed { old } => Some(*old),
            PatchOperation::Inserted { .. } | PatchOperation::ThunkDiff { .. } => None,
        }
    }
}

/// Every index owns an ordered list of operations, applied in arrival order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PatchScript<'a> {
    root: Option<&'a Node>,
    patches: BTreeMap<usize, Vec<PatchOperation<'a>>>,
}

impl<'a> PatchScript<'a> {
    pub(crate) fn new(root: Option<&'a Node>) -> Self {
        PatchScript {
            root,
            patches: BTreeMap::new(),
        }
    }

    pub(crate) fn push(&mut self, index: usize, operation: PatchOperation<'a>) {
        trace!("PatchScript: index={} kind={}", index, operation.kind());
        self.patches.entry(index).or_default().push(operation);
    }

    /// The old tree the script is addressed against.
    pub fn root(&self) -> Option<&'a Node> {
        self.root
    }

    pub fn get(&self, index: usize) -> &[PatchOperation<'a>] {
        self.patches.get(&index).map_or(&[][..], Vec::as_slice)
    }

    /// Indices in ascending order with their operations.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[PatchOperation<'a>])> + '_ {
        self.patches.iter().map(|(index, ops)| (*index, ops.as_slice()))
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.patches.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Number of patched indices.
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn operation_count(&self) -> usize {
        self.patches.values().map(Vec::len).sum()
    }

    pub fn to_json(&self) -> Result<serde_json::Value, DiffError> {
        Ok(serde_json::to_value(self)?)
    }
}
