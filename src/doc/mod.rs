//! Document layer: local-only snapshots and handles over the synchronized
//! (operational-transform) document boundary.

mod local_doc;
mod remote_doc;
mod sync_doc;

pub use local_doc::*;
pub use remote_doc::*;
pub use sync_doc::*;

#[cfg(test)]
mod local_doc_test;

use serde_json::Map;
use serde_json::Value;

use crate::ChangeKind;
use crate::Result;
use crate::StoreError;

/// Mutation op submitted to a synchronized document
#[derive(Debug, Clone, PartialEq)]
pub struct DocOp {
    /// Subpath within the document; empty means the whole document
    pub subpath: Vec<String>,
    pub kind: ChangeKind,
    /// New value for `Set`, `None` for `Del`
    pub value: Option<Value>,
}

impl DocOp {
    pub fn set(
        subpath: Vec<String>,
        value: Value,
    ) -> Self {
        Self {
            subpath,
            kind: ChangeKind::Set,
            value: Some(value),
        }
    }

    pub fn del(subpath: Vec<String>) -> Self {
        Self {
            subpath,
            kind: ChangeKind::Del,
            value: None,
        }
    }
}

/// A document entry in the store
#[derive(Debug, Clone)]
pub enum Doc {
    /// Local-only: raw snapshot, never synchronized
    Local(LocalDoc),
    /// Synchronized through the operational-transform document layer
    Remote(RemoteDoc),
}

impl Doc {
    pub fn id(&self) -> &str {
        match self {
            Doc::Local(doc) => doc.id(),
            Doc::Remote(doc) => doc.id(),
        }
    }

    /// Value at `subpath`; the whole snapshot for an empty subpath
    pub fn get<S: AsRef<str>>(
        &self,
        subpath: &[S],
    ) -> Option<Value> {
        match self {
            Doc::Local(doc) => doc.get(subpath).cloned(),
            Doc::Remote(doc) => doc.get(subpath),
        }
    }
}

/// Walk `subpath` down a snapshot value; numeric segments index arrays
pub(crate) fn value_at<'a, S: AsRef<str>>(
    root: &'a Value,
    subpath: &[S],
) -> Option<&'a Value> {
    let mut value = root;
    for segment in subpath {
        let segment = segment.as_ref();
        value = match value {
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            other => other.get(segment)?,
        };
    }
    Some(value)
}

/// Set `subpath` in `root` to `value`, creating intermediate objects as
/// needed. An empty subpath replaces the root. Setting through an ancestor
/// that is neither an object, an array slot, nor null is an error.
pub(crate) fn set_value<S: AsRef<str>>(
    root: &mut Value,
    subpath: &[S],
    value: Value,
) -> Result<()> {
    let (last, ancestors) = match subpath.split_last() {
        Some(split) => split,
        None => {
            *root = value;
            return Ok(());
        }
    };
    let mut target = root;
    for segment in ancestors {
        let segment = segment.as_ref();
        if target.is_null() {
            *target = Value::Object(Map::new());
        }
        target = match target {
            Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
            Value::Array(items) => match segment.parse::<usize>().ok().and_then(|index| items.get_mut(index)) {
                Some(item) => item,
                None => return Err(non_object_ancestor(subpath)),
            },
            _ => return Err(non_object_ancestor(subpath)),
        };
    }
    let last = last.as_ref();
    if target.is_null() {
        *target = Value::Object(Map::new());
    }
    match target {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        Value::Array(items) => match last.parse::<usize>().ok() {
            Some(index) if index < items.len() => {
                items[index] = value;
                Ok(())
            }
            Some(index) if index == items.len() => {
                items.push(value);
                Ok(())
            }
            _ => Err(non_object_ancestor(subpath)),
        },
        _ => Err(non_object_ancestor(subpath)),
    }
}

/// Remove the value at `subpath`. Absent paths are a silent no-op; an empty
/// subpath clears the root.
pub(crate) fn del_value<S: AsRef<str>>(
    root: &mut Value,
    subpath: &[S],
) {
    let (last, ancestors) = match subpath.split_last() {
        Some(split) => split,
        None => {
            *root = Value::Null;
            return;
        }
    };
    let mut target = root;
    for segment in ancestors {
        let segment = segment.as_ref();
        target = match target {
            Value::Object(map) => match map.get_mut(segment) {
                Some(item) => item,
                None => return,
            },
            Value::Array(items) => match segment.parse::<usize>().ok().and_then(|index| items.get_mut(index)) {
                Some(item) => item,
                None => return,
            },
            _ => return,
        };
    }
    let last = last.as_ref();
    match target {
        Value::Object(map) => {
            map.remove(last);
        }
        Value::Array(items) => {
            if let Ok(index) = last.parse::<usize>() {
                if index < items.len() {
                    items.remove(index);
                }
            }
        }
        _ => {}
    }
}

fn non_object_ancestor<S: AsRef<str>>(subpath: &[S]) -> crate::Error {
    StoreError::NonObjectAncestor {
        path: subpath.iter().map(|segment| segment.as_ref()).collect::<Vec<_>>().join("."),
    }
    .into()
}
