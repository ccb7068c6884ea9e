//! Keyed child-list reconciliation: naive left-to-right reordering, O(max(N, M))
use crate::types::Node;
use log::warn;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Old children aligned to new ones: `children[i]` is the new counterpart of
/// old child `i` (or `None` when it was dropped), followed by new-only children.
#[derive(Debug)]
pub struct Reordered<'a> {
    pub children: Vec<Option<&'a Node>>,
    pub moves: Option<Moves<'a>>,
}

/// Applied after all positional child patches: every remove in order, then every insert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Moves<'a> {
    pub removes: Vec<MoveRemove<'a>>,
    pub inserts: Vec<MoveInsert<'a>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MoveRemove<'a> {
    pub from: usize,
    pub key: Option<&'a str>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MoveInsert<'a> {
    pub key: &'a str,
    pub to: usize,
}

struct KeyIndex<'a> {
    keys: HashMap<&'a str, usize>,
    free: Vec<usize>,
}

fn key_index<'a>(keys: &[Option<&'a str>]) -> KeyIndex<'a> {
    let mut index = KeyIndex {
        keys: HashMap::with_capacity(keys.len()),
        free: Vec::new(),
    };
    for (i, key) in keys.iter().enumerate() {
        match key {
            Some(key) => {
                index.keys.insert(*key, i);
            }
            None => index.free.push(i),
        }
    }
    index
}

/// Keys as seen by the reconciler: the first sibling with a key keeps it,
/// later siblings repeating it are treated as unkeyed.
fn effective_keys(children: &[Node]) -> Vec<Option<&str>> {
    let mut seen = HashSet::with_capacity(children.len());
    children
        .iter()
        .map(|child| {
            let key = child.key()?;
            if seen.insert(key) {
                Some(key)
            } else {
                warn!("reorder: duplicate sibling key '{}' reconciled as unkeyed", key);
                None
            }
        })
        .collect()
}

/// First key that appears on more than one sibling.
pub fn duplicate_key(children: &[Node]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(children.len());
    children
        .iter()
        .filter_map(Node::key)
        .find(|key| !seen.insert(*key))
}

fn positional(b: &[Node]) -> Reordered<'_> {
    Reordered {
        children: b.iter().map(Some).collect(),
        moves: None,
    }
}

fn remove_at<'a>(simulate: &mut Vec<Option<usize>>, at: usize, key: Option<&'a str>) -> MoveRemove<'a> {
    simulate.remove(at);
    MoveRemove { from: at, key }
}

/// Not move-optimal: new keyed items are appended and then moved into place.
pub fn reorder<'a>(a: &'a [Node], b: &'a [Node]) -> Reordered<'a> {
    let b_keys = effective_keys(b);
    let b_index = key_index(&b_keys);
    if b_index.free.len() == b.len() {
        return positional(b);
    }

    let a_keys = effective_keys(a);
    let a_index = key_index(&a_keys);
    if a_index.free.len() == a.len() {
        return positional(b);
    }

    // Slots hold indices into `b`; `None` marks an old child with no counterpart.
    let mut slots: Vec<Option<usize>> = Vec::with_capacity(a.len().max(b.len()));
    let mut free_index = 0;
    let free_count = b_index.free.len();
    let mut deleted = 0;

    for a_key in &a_keys {
        let matched = match a_key {
            Some(key) => b_index.keys.get(key).copied(),
            None if free_index < free_count => {
                free_index += 1;
                Some(b_index.free[free_index - 1])
            }
            None => None,
        };
        if matched.is_none() {
            deleted += 1;
        }
        slots.push(matched);
    }

    // Unkeyed new children from here on had no old partner and are appended.
    let last_free_index = b_index.free.get(free_index).copied().unwrap_or(b.len());

    for (j, b_key) in b_keys.iter().enumerate() {
        let appended = match b_key {
            Some(key) => !a_index.keys.contains_key(key),
            None => j >= last_free_index,
        };
        if appended {
            slots.push(Some(j));
        }
    }

    let key_of = |slot: Option<usize>| slot.and_then(|i| b_keys[i]);

    let mut simulate = slots.clone();
    let mut cursor = 0;
    let mut removes = Vec::new();
    let mut inserts = Vec::new();
    let mut k = 0;

    while k < b.len() {
        let wanted_key = b_keys[k];

        while let Some(None) = simulate.get(cursor) {
            removes.push(remove_at(&mut simulate, cursor, None));
        }

        let item = simulate.get(cursor).copied().flatten();
        let item_key = key_of(item);

        if item.is_some() && item_key == wanted_key {
            cursor += 1;
            k += 1;
            continue;
        }

        match (wanted_key, item_key) {
            (Some(wanted), Some(current)) => {
                // An insert ahead of `current` would put it in place; otherwise move it.
                if b_index.keys.get(current) != Some(&(k + 1)) {
                    removes.push(remove_at(&mut simulate, cursor, Some(current)));
                    let next = simulate.get(cursor).copied().flatten();
                    if next.is_some() && key_of(next) == Some(wanted) {
                        cursor += 1;
                    } else {
                        inserts.push(MoveInsert { key: wanted, to: k });
                    }
                } else {
                    inserts.push(MoveInsert { key: wanted, to: k });
                }
                k += 1;
            }
            (Some(wanted), None) => {
                inserts.push(MoveInsert { key: wanted, to: k });
                k += 1;
            }
            (None, Some(current)) => {
                removes.push(remove_at(&mut simulate, cursor, Some(current)));
            }
            // Cursor exhausted on an unkeyed want: stepping `k` keeps the loop finite.
            (None, None) => k += 1,
        }
    }

    while cursor < simulate.len() {
        let item = simulate[cursor];
        removes.push(remove_at(&mut simulate, cursor, key_of(item)));
    }

    let children = slots.iter().map(|slot| slot.map(|i| &b[i])).collect();

    // Pure deletions are already implied by the `None` slots.
    if removes.len() == deleted && inserts.is_empty() {
        return Reordered { children, moves: None };
    }

    Reordered {
        children,
        moves: Some(Moves { removes, inserts }),
    }
}
