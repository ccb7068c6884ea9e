#![allow(dead_code)]
//! In-memory renderer used to check that scripts rebuild the new tree.
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use vtree_diff::{
    ElementNode, Hook, Node, PatchOperation, PatchScript, PropChange, PropValue, PropertyApplier, Props, PropsDiff,
    Renderer, Widget,
};

pub type Journal = Rc<RefCell<Vec<String>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

/// Hook that writes `hook:<name>` / `unhook:<name>` into a shared journal.
pub struct Recorder {
    pub name: &'static str,
    pub journal: Journal,
}

impl fmt::Debug for Recorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Recorder({})", self.name)
    }
}

impl Hook for Recorder {
    fn hook(&self, _target: &mut dyn Any, _property: &str, _previous: Option<&PropValue>) {
        self.journal.borrow_mut().push(format!("hook:{}", self.name));
    }

    fn unhook(&self, _target: &mut dyn Any, _property: &str, _next: Option<&PropValue>) {
        self.journal.borrow_mut().push(format!("unhook:{}", self.name));
    }

    fn has_unhook(&self) -> bool {
        true
    }
}

/// Destroyable widget that writes `create:<name>` / `destroy:<name>`.
pub struct Gauge {
    pub name: &'static str,
    pub journal: Journal,
}

impl fmt::Debug for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gauge({})", self.name)
    }
}

impl Widget for Gauge {
    fn create(&self) -> Box<dyn Any> {
        self.journal.borrow_mut().push(format!("create:{}", self.name));
        Box::new(self.name)
    }

    fn destroy(&self, _rendered: &mut dyn Any) {
        self.journal.borrow_mut().push(format!("destroy:{}", self.name));
    }

    fn can_destroy(&self) -> bool {
        true
    }
}

pub fn el(tag: &str, children: Vec<Node>) -> Node {
    Node::element(tag, Props::new(), children)
}

pub fn keyed(tag: &str, key: &str, children: Vec<Node>) -> Node {
    ElementNode::new(tag, Props::new(), children).with_key(key).into()
}

pub fn with_props(tag: &str, props: Vec<(&str, PropValue)>, children: Vec<Node>) -> Node {
    let props: Props = props.into_iter().map(|(name, value)| (name.to_string(), value)).collect();
    Node::element(tag, props, children)
}

pub fn text(value: &str) -> Node {
    Node::text(value)
}

/// Comparable snapshot of rendered output.
#[derive(Debug, PartialEq)]
pub enum Shape {
    Element {
        tag: String,
        namespace: Option<String>,
        props: Value,
        children: Vec<Shape>,
    },
    Text(String),
    Widget(String),
}

#[derive(Debug)]
enum Kind {
    Element {
        tag: String,
        namespace: Option<String>,
        props: Props,
    },
    Text(String),
    Widget(String),
}

#[derive(Debug)]
struct Slot {
    kind: Kind,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Applies property diffs to a plain map, firing hook callbacks.
#[derive(Default)]
pub struct MapApplier;

impl PropertyApplier for MapApplier {
    type Target = Props;

    fn apply_properties(&mut self, target: &mut Props, diff: &PropsDiff<'_>, _previous: Option<&Props>) {
        for (&name, change) in diff {
            let prior = target.get(name).cloned();
            match change {
                PropChange::Removed => {
                    if let Some(hook) = prior.as_ref().and_then(PropValue::as_hook) {
                        if hook.unhooks() {
                            hook.hook().unhook(&mut *target, name, None);
                        }
                    }
                    target.shift_remove(name);
                }
                PropChange::Set(value) => {
                    if let Some(hook) = prior.as_ref().and_then(PropValue::as_hook) {
                        if hook.unhooks() {
                            hook.hook().unhook(&mut *target, name, Some(*value));
                        }
                    }
                    if let Some(hook) = value.as_hook() {
                        hook.hook().hook(&mut *target, name, prior.as_ref());
                    }
                    target.insert(name.to_string(), (*value).clone());
                }
                PropChange::Nested(inner) => {
                    let entry = target
                        .entry(name.to_string())
                        .or_insert_with(|| PropValue::Map(Props::new()));
                    if entry.as_map().is_none() {
                        *entry = PropValue::Map(Props::new());
                    }
                    if let PropValue::Map(map) = entry {
                        apply_nested(map, inner);
                    }
                }
            }
        }
    }
}

fn apply_nested(target: &mut Props, diff: &PropsDiff<'_>) {
    for (&name, change) in diff {
        match change {
            PropChange::Removed => {
                target.shift_remove(name);
            }
            PropChange::Set(value) => {
                target.insert(name.to_string(), (*value).clone());
            }
            PropChange::Nested(inner) => {
                let entry = target
                    .entry(name.to_string())
                    .or_insert_with(|| PropValue::Map(Props::new()));
                if entry.as_map().is_none() {
                    *entry = PropValue::Map(Props::new());
                }
                if let PropValue::Map(map) = entry {
                    apply_nested(map, inner);
                }
            }
        }
    }
}

/// Arena of rendered nodes; handles are slot indices.
#[derive(Default)]
pub struct MockDom {
    slots: Vec<Slot>,
    applier: MapApplier,
}

impl MockDom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shape(&self, handle: usize) -> Shape {
        let slot = &self.slots[handle];
        match &slot.kind {
            Kind::Element { tag, namespace, props } => Shape::Element {
                tag: tag.clone(),
                namespace: namespace.clone(),
                props: serde_json::to_value(props).unwrap_or(Value::Null),
                children: slot.children.iter().map(|&child| self.shape(child)).collect(),
            },
            Kind::Text(value) => Shape::Text(value.clone()),
            Kind::Widget(name) => Shape::Widget(name.clone()),
        }
    }

    pub fn is_attached(&self, handle: usize) -> bool {
        self.slots[handle].parent.is_some()
    }

    fn alloc(&mut self, kind: Kind) -> usize {
        self.slots.push(Slot {
            kind,
            parent: None,
            children: Vec::new(),
        });
        self.slots.len() - 1
    }

    fn append(&mut self, parent: usize, child: usize) {
        self.slots[child].parent = Some(parent);
        self.slots[parent].children.push(child);
    }

    fn detach(&mut self, handle: usize) {
        if let Some(parent) = self.slots[handle].parent.take() {
            self.slots[parent].children.retain(|&child| child != handle);
        }
    }

    fn replace(&mut self, old: usize, new: usize) {
        if let Some(parent) = self.slots[old].parent.take() {
            if let Some(position) = self.slots[parent].children.iter().position(|&child| child == old) {
                self.slots[parent].children[position] = new;
                self.slots[new].parent = Some(parent);
            }
        }
    }

    fn apply_props(&mut self, handle: usize, diff: &PropsDiff<'_>) {
        if let Kind::Element { props, .. } = &mut self.slots[handle].kind {
            self.applier.apply_properties(props, diff, None);
        }
    }

    /// Index to handle, walking `node` and the rendered subtree at `handle` in lockstep.
    fn resolve(&self, node: &Node, handle: usize, index: usize, out: &mut HashMap<usize, usize>) {
        out.insert(index, handle);
        if let Node::Element(element) = node {
            let mut child_index = index;
            for (position, child) in element.children().iter().enumerate() {
                child_index += 1;
                self.resolve(child, self.slots[handle].children[position], child_index, out);
                child_index += child.count();
            }
        }
    }

    fn apply(&mut self, handle: usize, operation: &PatchOperation<'_>, replacing: bool) -> Result<Option<usize>, String> {
        match operation {
            PatchOperation::TextChanged { new, .. } => {
                if let Node::Text(new) = new {
                    self.slots[handle].kind = Kind::Text(new.text().to_string());
                }
            }
            PatchOperation::Replaced { new, .. } => {
                let fresh = self.render(new)?;
                self.replace(handle, fresh);
                return Ok(Some(fresh));
            }
            PatchOperation::WidgetOp { old, new } => {
                if let Some(Node::Widget(old)) = old {
                    if old.destroyable() {
                        old.widget().destroy(&mut ());
                    }
                }
                let fresh = self.render(new)?;
                self.replace(handle, fresh);
                return Ok(Some(fresh));
            }
            PatchOperation::PropsChanged { props, .. } => self.apply_props(handle, props),
            PatchOperation::Inserted { new } => {
                let fresh = self.render(new)?;
                self.append(handle, fresh);
            }
            PatchOperation::Removed { old } => {
                // a later Replaced at this index does the swap
                if !replacing {
                    self.detach(handle);
                }
                if let Node::Widget(widget) = old {
                    if widget.destroyable() {
                        widget.widget().destroy(&mut ());
                    }
                }
            }
            PatchOperation::Reordered { moves, .. } => {
                let mut stash = HashMap::new();
                for remove in &moves.removes {
                    let children = &mut self.slots[handle].children;
                    if remove.from >= children.len() {
                        return Err(format!("remove from {} past {} children", remove.from, children.len()));
                    }
                    let child = children.remove(remove.from);
                    match remove.key {
                        Some(key) => {
                            stash.insert(key, child);
                        }
                        None => self.slots[child].parent = None,
                    }
                }
                for insert in &moves.inserts {
                    let child = stash
                        .remove(insert.key)
                        .ok_or_else(|| format!("insert of unknown key {}", insert.key))?;
                    let children = &mut self.slots[handle].children;
                    let to = insert.to.min(children.len());
                    children.insert(to, child);
                }
                for (_, orphan) in stash {
                    self.slots[orphan].parent = None;
                }
            }
            PatchOperation::ThunkDiff { script } => {
                let fresh = self.patch(handle, script)?;
                if fresh != handle {
                    return Ok(Some(fresh));
                }
            }
        }
        Ok(None)
    }
}

impl Renderer for MockDom {
    type Handle = usize;
    type Error = String;

    fn render(&mut self, node: &Node) -> Result<usize, String> {
        match node {
            Node::Element(element) => {
                let handle = self.alloc(Kind::Element {
                    tag: element.tag().to_string(),
                    namespace: element.namespace().map(str::to_string),
                    props: Props::new(),
                });
                let empty = Props::new();
                if let Some(diff) = vtree_diff::diff_props(&empty, element.properties()) {
                    self.apply_props(handle, &diff);
                }
                for child in element.children() {
                    let child = self.render(child)?;
                    self.append(handle, child);
                }
                Ok(handle)
            }
            Node::Text(value) => Ok(self.alloc(Kind::Text(value.text().to_string()))),
            Node::Widget(widget) => {
                widget.widget().create();
                Ok(self.alloc(Kind::Widget(format!("{:?}", widget.widget()))))
            }
            Node::Thunk(thunk) => {
                let rendered = thunk.render(None).map_err(|err| err.to_string())?;
                self.render(rendered)
            }
        }
    }

    fn patch(&mut self, root: usize, script: &PatchScript<'_>) -> Result<usize, String> {
        let mut handles = HashMap::new();
        if let Some(old) = script.root() {
            self.resolve(old, root, 0, &mut handles);
        } else {
            handles.insert(0, root);
        }

        let mut current = root;
        for (index, operations) in script.iter() {
            let handle = *handles
                .get(&index)
                .ok_or_else(|| format!("no rendered node at index {index}"))?;
            let replacing = operations
                .iter()
                .any(|operation| matches!(operation, PatchOperation::Replaced { .. }));
            for operation in operations {
                if let Some(fresh) = self.apply(handle, operation, replacing)? {
                    if handle == root {
                        current = fresh;
                    }
                }
            }
        }
        Ok(current)
    }
}

/// Renders `old`, applies `diff(old, new)` and compares with a fresh render of `new`.
pub fn assert_roundtrip(old: &Node, new: &Node) {
    let mut dom = MockDom::new();
    let root = dom.render(old).expect("render old");
    let script = vtree_diff::diff(Some(old), Some(new)).expect("diff");
    let patched = dom.patch(root, &script).expect("patch");

    let mut expected = MockDom::new();
    let fresh = expected.render(new).expect("render new");
    assert_eq!(dom.shape(patched), expected.shape(fresh), "script: {script:?}");
}
