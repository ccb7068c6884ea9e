//! JSON tree interchange: trees in, serialized scripts out
use crate::config::DiffOptions;
use crate::diff_engine::diff_with;
use crate::errors::DiffError;
use crate::types::{ElementNode, Node, PropValue, Props};
use serde_json::{Map, Value};

/// Parses one node.
///
/// A string or `{"text": ..}` is a text node; `{"tag": .., "key"?, "namespace"?,
/// "properties"?, "children"?}` is an element. Anything else is `InvalidNode`.
pub fn node_from_json(value: &Value) -> Result<Node, DiffError> {
    parse_node(value, "")
}

/// Like [`node_from_json`], with `null` meaning no tree.
pub fn tree_from_json(value: &Value) -> Result<Option<Node>, DiffError> {
    if value.is_null() {
        Ok(None)
    } else {
        node_from_json(value).map(Some)
    }
}

/// Parses both trees, diffs them and serializes the script.
pub fn diff_json(old: &Value, new: &Value, options: DiffOptions) -> Result<Value, DiffError> {
    let old = tree_from_json(old)?;
    let new = tree_from_json(new)?;
    diff_with(old.as_ref(), new.as_ref(), options)?.to_json()
}

fn parse_node(value: &Value, path: &str) -> Result<Node, DiffError> {
    match value {
        Value::String(text) => Ok(Node::text(text.clone())),
        Value::Object(map) if map.contains_key("tag") => parse_element(map, path),
        Value::Object(map) => match map.get("text") {
            Some(Value::String(text)) => Ok(Node::text(text.clone())),
            Some(_) => Err(DiffError::invalid_node(&format!("{path}/text"), "text must be a string")),
            None => Err(DiffError::invalid_node(path, "expected a 'tag' or 'text' field")),
        },
        other => Err(DiffError::invalid_node(
            path,
            format!("expected a node object or string, got {}", kind_of(other)),
        )),
    }
}

fn parse_element(map: &Map<String, Value>, path: &str) -> Result<Node, DiffError> {
    let tag = match map.get("tag") {
        Some(Value::String(tag)) if !tag.is_empty() => tag.as_str(),
        _ => return Err(DiffError::invalid_node(&format!("{path}/tag"), "tag must be a non-empty string")),
    };

    let properties: Props = match map.get("properties") {
        None | Some(Value::Null) => Props::new(),
        Some(Value::Object(props)) => props
            .iter()
            .map(|(name, value)| (name.clone(), PropValue::from(value.clone())))
            .collect(),
        Some(_) => {
            return Err(DiffError::invalid_node(
                &format!("{path}/properties"),
                "properties must be an object",
            ));
        }
    };

    let children = match map.get("children") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, child)| parse_node(child, &format!("{path}/children/{i}")))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(DiffError::invalid_node(
                &format!("{path}/children"),
                "children must be an array",
            ));
        }
    };

    let mut element = ElementNode::new(tag, properties, children);

    match map.get("key") {
        None | Some(Value::Null) => {}
        Some(Value::String(key)) => element = element.with_key(key.clone()),
        Some(Value::Number(key)) => element = element.with_key(key.to_string()),
        Some(_) => {
            return Err(DiffError::invalid_node(
                &format!("{path}/key"),
                "key must be a string or number",
            ));
        }
    }

    match map.get("namespace") {
        None | Some(Value::Null) => {}
        Some(Value::String(namespace)) => element = element.with_namespace(namespace.clone()),
        Some(_) => {
            return Err(DiffError::invalid_node(
                &format!("{path}/namespace"),
                "namespace must be a string",
            ));
        }
    }

    Ok(element.into())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
