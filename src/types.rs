//! Immutable tree model with subtree metrics cached at construction
use crate::errors::{DiffError, RenderError};
use indexmap::IndexMap;
use once_cell::unsync::OnceCell;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Property mapping of an element, iterated in insertion order.
pub type Props = IndexMap<String, PropValue>;

/// A property value with attach/detach callbacks, invoked by the property applier.
pub trait Hook: fmt::Debug {
    fn hook(&self, _target: &mut dyn Any, _property: &str, _previous: Option<&PropValue>) {}

    fn unhook(&self, _target: &mut dyn Any, _property: &str, _next: Option<&PropValue>) {}

    /// Whether `unhook` does anything. Only such hooks are tracked for teardown.
    fn has_unhook(&self) -> bool {
        false
    }
}

/// An externally managed unit. The diff never looks inside it.
pub trait Widget: fmt::Debug {
    fn create(&self) -> Box<dyn Any>;

    /// Returns a replacement when the rendered output can't be updated in place.
    fn update(&self, _previous: &dyn Widget, _rendered: &mut dyn Any) -> Option<Box<dyn Any>> {
        None
    }

    fn destroy(&self, _rendered: &mut dyn Any) {}

    /// Whether `destroy` must be called before the widget is discarded.
    fn can_destroy(&self) -> bool {
        false
    }

    fn key(&self) -> Option<&str> {
        None
    }
}

/// Shared handle to a hook, with its unhook capability probed once.
#[derive(Clone, Debug)]
pub struct HookValue {
    hook: Rc<dyn Hook>,
    unhooks: bool,
}

impl HookValue {
    pub fn new(hook: Rc<dyn Hook>) -> Self {
        let unhooks = hook.has_unhook();
        HookValue { hook, unhooks }
    }

    pub fn hook(&self) -> &dyn Hook {
        self.hook.as_ref()
    }

    pub fn unhooks(&self) -> bool {
        self.unhooks
    }

    /// Identity comparison; two hooks are never merged.
    pub fn same(&self, other: &HookValue) -> bool {
        Rc::ptr_eq(&self.hook, &other.hook)
    }
}

#[derive(Clone, Debug)]
pub enum PropValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<PropValue>),
    Map(Props),
    Hook(HookValue),
}

impl PropValue {
    pub fn hook(hook: impl Hook + 'static) -> Self {
        PropValue::Hook(HookValue::new(Rc::new(hook)))
    }

    pub fn as_map(&self) -> Option<&Props> {
        match self {
            PropValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_hook(&self) -> Option<&HookValue> {
        match self {
            PropValue::Hook(hook) => Some(hook),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Null, PropValue::Null) => true,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Number(a), PropValue::Number(b)) => a == b,
            (PropValue::String(a), PropValue::String(b)) => a == b,
            (PropValue::List(a), PropValue::List(b)) => a == b,
            (PropValue::Map(a), PropValue::Map(b)) => a == b,
            (PropValue::Hook(a), PropValue::Hook(b)) => a.same(b),
            _ => false,
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::String(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::String(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Number(value.into())
    }
}

/// NaN and the infinities have no JSON form and become `PropValue::Null`.
impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value).map_or(PropValue::Null, PropValue::Number)
    }
}

impl From<Props> for PropValue {
    fn from(value: Props) -> Self {
        PropValue::Map(value)
    }
}

impl From<Vec<PropValue>> for PropValue {
    fn from(value: Vec<PropValue>) -> Self {
        PropValue::List(value)
    }
}

impl From<serde_json::Value> for PropValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => PropValue::Null,
            serde_json::Value::Bool(b) => PropValue::Bool(b),
            serde_json::Value::Number(n) => PropValue::Number(n),
            serde_json::Value::String(s) => PropValue::String(s),
            serde_json::Value::Array(items) => {
                PropValue::List(items.into_iter().map(PropValue::from).collect())
            }
            serde_json::Value::Object(map) => PropValue::Map(
                map.into_iter().map(|(k, v)| (k, PropValue::from(v))).collect(),
            ),
        }
    }
}

impl Serialize for PropValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PropValue::Null => serializer.serialize_unit(),
            PropValue::Bool(b) => serializer.serialize_bool(*b),
            PropValue::Number(n) => n.serialize(serializer),
            PropValue::String(s) => serializer.serialize_str(s),
            PropValue::List(items) => items.serialize(serializer),
            PropValue::Map(map) => map.serialize(serializer),
            PropValue::Hook(hook) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("hook", &format!("{:?}", hook.hook))?;
                map.end()
            }
        }
    }
}

fn normalize_key(key: String) -> Option<String> {
    if key.is_empty() { None } else { Some(key) }
}

#[derive(Clone, Debug)]
pub struct ElementNode {
    tag: String,
    namespace: Option<String>,
    key: Option<String>,
    properties: Props,
    children: Vec<Node>,
    count: usize,
    has_widgets: bool,
    has_thunks: bool,
    hooks: Vec<String>,
    descendant_hooks: bool,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>, properties: Props, children: Vec<Node>) -> Self {
        let hooks = properties
            .iter()
            .filter(|(_, value)| value.as_hook().is_some_and(HookValue::unhooks))
            .map(|(name, _)| name.clone())
            .collect();

        let mut descendants = 0;
        let mut has_widgets = false;
        let mut has_thunks = false;
        let mut descendant_hooks = false;

        for child in &children {
            match child {
                Node::Element(element) => {
                    descendants += element.count;
                    has_widgets |= element.has_widgets;
                    has_thunks |= element.has_thunks;
                    descendant_hooks |= element.has_own_hooks() || element.descendant_hooks;
                }
                Node::Widget(widget) => has_widgets |= widget.destroyable,
                Node::Thunk(_) => has_thunks = true,
                Node::Text(_) => {}
            }
        }

        ElementNode {
            tag: tag.into(),
            namespace: None,
            key: None,
            properties,
            count: children.len() + descendants,
            children,
            has_widgets,
            has_thunks,
            hooks,
            descendant_hooks,
        }
    }

    /// An empty key is the same as no key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = normalize_key(key.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn properties(&self) -> &Props {
        &self.properties
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Number of index slots the subtree occupies below this node.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn has_widgets(&self) -> bool {
        self.has_widgets
    }

    pub fn has_thunks(&self) -> bool {
        self.has_thunks
    }

    /// Names of the properties holding hooks with an unhook capability.
    pub fn hook_names(&self) -> &[String] {
        &self.hooks
    }

    pub fn has_own_hooks(&self) -> bool {
        !self.hooks.is_empty()
    }

    pub fn has_descendant_hooks(&self) -> bool {
        self.descendant_hooks
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextNode {
    text: String,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        TextNode { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Clone, Debug)]
pub struct WidgetNode {
    widget: Rc<dyn Widget>,
    destroyable: bool,
    key: Option<String>,
}

impl WidgetNode {
    pub fn new(widget: Rc<dyn Widget>) -> Self {
        let destroyable = widget.can_destroy();
        let key = widget.key().map(str::to_string).and_then(normalize_key);
        WidgetNode { widget, destroyable, key }
    }

    pub fn widget(&self) -> &dyn Widget {
        self.widget.as_ref()
    }

    pub fn destroyable(&self) -> bool {
        self.destroyable
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn same(&self, other: &WidgetNode) -> bool {
        Rc::ptr_eq(&self.widget, &other.widget)
    }
}

/// Render closure of a thunk, handed the node it replaces (if any) for reuse.
pub type RenderFn = dyn Fn(Option<&Node>) -> Result<Node, RenderError>;

/// A lazily rendered node. The first successful render is cached for the
/// lifetime of the instance; the cache is single-threaded and must not be
/// shared across concurrent diffs.
#[derive(Clone)]
pub struct Thunk {
    render: Rc<RenderFn>,
    key: Option<String>,
    rendered: OnceCell<Box<Node>>,
}

impl Thunk {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(Option<&Node>) -> Result<Node, RenderError> + 'static,
    {
        Thunk {
            render: Rc::new(render),
            key: None,
            rendered: OnceCell::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = normalize_key(key.into());
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The cached render result, if this thunk has been rendered.
    pub fn rendered(&self) -> Option<&Node> {
        self.rendered.get().map(|node| &**node)
    }

    /// Render once and cache. A nested thunk result is rejected and not cached.
    pub fn render(&self, previous: Option<&Node>) -> Result<&Node, DiffError> {
        self.rendered
            .get_or_try_init(|| {
                let node = (self.render)(previous).map_err(DiffError::ThunkRender)?;
                if let Node::Thunk(_) = node {
                    return Err(DiffError::InvalidThunkResult);
                }
                Ok(Box::new(node))
            })
            .map(|node| &**node)
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thunk")
            .field("key", &self.key)
            .field("rendered", &self.rendered())
            .finish()
    }
}

#[derive(Clone, Debug)]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    Widget(WidgetNode),
    Thunk(Thunk),
}

impl Node {
    pub fn element(tag: impl Into<String>, properties: Props, children: Vec<Node>) -> Self {
        Node::Element(ElementNode::new(tag, properties, children))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode::new(text))
    }

    pub fn widget(widget: impl Widget + 'static) -> Self {
        Node::Widget(WidgetNode::new(Rc::new(widget)))
    }

    pub fn thunk<F>(render: F) -> Self
    where
        F: Fn(Option<&Node>) -> Result<Node, RenderError> + 'static,
    {
        Node::Thunk(Thunk::new(render))
    }

    /// Reconciliation identity. Text nodes never carry a key.
    pub fn key(&self) -> Option<&str> {
        match self {
            Node::Element(element) => element.key(),
            Node::Widget(widget) => widget.key(),
            Node::Thunk(thunk) => thunk.key(),
            Node::Text(_) => None,
        }
    }

    /// Index slots below this node; zero for everything but elements.
    pub fn count(&self) -> usize {
        match self {
            Node::Element(element) => element.count(),
            _ => 0,
        }
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_widget(&self) -> bool {
        matches!(self, Node::Widget(_))
    }

    pub fn is_thunk(&self) -> bool {
        matches!(self, Node::Thunk(_))
    }

    /// Same instance: an identical reference, or two handles to one widget.
    pub fn same(a: &Node, b: &Node) -> bool {
        if std::ptr::eq(a, b) {
            return true;
        }
        matches!((a, b), (Node::Widget(x), Node::Widget(y)) if x.same(y))
    }

    /// Every node of the tree paired with its tree-walk index, in pre-order.
    /// Thunks occupy one slot; their rendered output is addressed by the
    /// thunk's own sub-script.
    pub fn indexed(&self) -> Vec<(usize, &Node)> {
        let mut out = Vec::with_capacity(self.count() + 1);
        collect_indexed(self, 0, &mut out);
        out
    }
}

fn collect_indexed<'a>(node: &'a Node, index: usize, out: &mut Vec<(usize, &'a Node)>) {
    out.push((index, node));
    if let Node::Element(element) = node {
        let mut index = index;
        for child in element.children() {
            index += 1;
            collect_indexed(child, index, out);
            index += child.count();
        }
    }
}

impl From<ElementNode> for Node {
    fn from(value: ElementNode) -> Self {
        Node::Element(value)
    }
}

impl From<TextNode> for Node {
    fn from(value: TextNode) -> Self {
        Node::Text(value)
    }
}

impl From<WidgetNode> for Node {
    fn from(value: WidgetNode) -> Self {
        Node::Widget(value)
    }
}

impl From<Thunk> for Node {
    fn from(value: Thunk) -> Self {
        Node::Thunk(value)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Node::Element(element) => {
                map.serialize_entry("tag", element.tag())?;
                if let Some(namespace) = element.namespace() {
                    map.serialize_entry("namespace", namespace)?;
                }
                if let Some(key) = element.key() {
                    map.serialize_entry("key", key)?;
                }
                map.serialize_entry("properties", element.properties())?;
                map.serialize_entry("children", element.children())?;
            }
            Node::Text(text) => map.serialize_entry("text", text.text())?,
            Node::Widget(widget) => {
                map.serialize_entry("widget", &format!("{:?}", widget.widget()))?;
                if let Some(key) = widget.key() {
                    map.serialize_entry("key", key)?;
                }
            }
            Node::Thunk(thunk) => {
                map.serialize_entry("thunk", &thunk.rendered())?;
                if let Some(key) = thunk.key() {
                    map.serialize_entry("key", key)?;
                }
            }
        }
        map.end()
    }
}
