//! Collection bookkeeping: named maps of documents.

use std::collections::BTreeMap;

use serde_json::Map;
use serde_json::Value;

use crate::Doc;

/// Whether a collection name denotes local-only storage. Names starting
/// with an underscore are user-defined local collections, a dollar sign
/// marks framework-defined local collections; all others are synchronized.
pub(crate) fn is_local_collection(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('$')
}

/// One named collection of documents
#[derive(Debug, Default)]
pub(crate) struct Collection {
    pub(crate) docs: BTreeMap<String, Doc>,
}

impl Collection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Snapshot view of every document in the collection
    pub(crate) fn get(&self) -> Value {
        let mut out = Map::new();
        for (id, doc) in &self.docs {
            out.insert(id.clone(), doc.get::<&str>(&[]).unwrap_or(Value::Null));
        }
        Value::Object(out)
    }
}
