//! Structural diff of two property mappings
use crate::types::{PropValue, Props};
use indexmap::IndexMap;
use serde::Serialize;

/// Top-level property reconciled entry by entry by the property applier.
pub const ATTRIBUTES: &str = "attributes";

/// One changed property. `Removed` serializes as `null`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropChange<'a> {
    Removed,
    Set(&'a PropValue),
    Nested(PropsDiff<'a>),
}

/// Changed keys only, in the order they were found: old keys first, then additions.
pub type PropsDiff<'a> = IndexMap<&'a str, PropChange<'a>>;

/// Returns `None` when nothing changed. Callers must not emit a props patch then.
pub fn diff_props<'a>(a: &'a Props, b: &'a Props) -> Option<PropsDiff<'a>> {
    diff_entries(a, b, true)
}

fn diff_entries<'a>(a: &'a Props, b: &'a Props, top_level: bool) -> Option<PropsDiff<'a>> {
    let mut diff = PropsDiff::new();

    for (key, a_value) in a {
        let Some(b_value) = b.get(key) else {
            diff.insert(key.as_str(), PropChange::Removed);
            continue;
        };

        let change = match (a_value, b_value) {
            // Hooks are replaced, never merged, so hook/unhook fire on the applier side.
            (PropValue::Hook(x), PropValue::Hook(y)) => (!x.same(y)).then_some(PropChange::Set(b_value)),
            (PropValue::Map(x), PropValue::Map(y)) if top_level && key == ATTRIBUTES => {
                diff_attributes(x, y).map(PropChange::Nested)
            }
            (PropValue::Map(x), PropValue::Map(y)) => diff_entries(x, y, false).map(PropChange::Nested),
            _ if a_value == b_value => None,
            _ => Some(PropChange::Set(b_value)),
        };

        if let Some(change) = change {
            diff.insert(key.as_str(), change);
        }
    }

    for (key, b_value) in b {
        if !a.contains_key(key) {
            diff.insert(key.as_str(), PropChange::Set(b_value));
        }
    }

    (!diff.is_empty()).then_some(diff)
}

/// Flat per-attribute diff: values are set or removed whole.
fn diff_attributes<'a>(a: &'a Props, b: &'a Props) -> Option<PropsDiff<'a>> {
    let mut diff = PropsDiff::new();

    for (name, a_value) in a {
        match b.get(name) {
            None => {
                diff.insert(name.as_str(), PropChange::Removed);
            }
            Some(b_value) if b_value != a_value => {
                diff.insert(name.as_str(), PropChange::Set(b_value));
            }
            Some(_) => {}
        }
    }

    for (name, b_value) in b {
        if !a.contains_key(name) {
            diff.insert(name.as_str(), PropChange::Set(b_value));
        }
    }

    (!diff.is_empty()).then_some(diff)
}
