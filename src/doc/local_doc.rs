//! Local-only document: plain snapshot storage with nested subpath access.

use serde_json::Value;

use super::del_value;
use super::set_value;
use super::value_at;
use crate::Result;

#[derive(Debug, Clone)]
pub struct LocalDoc {
    collection: String,
    id: String,
    snapshot: Value,
}

impl LocalDoc {
    pub(crate) fn new(
        collection: &str,
        id: &str,
        data: Value,
    ) -> Self {
        Self {
            collection: collection.to_string(),
            id: id.to_string(),
            snapshot: data,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn snapshot(&self) -> &Value {
        &self.snapshot
    }

    /// Value at `subpath`, or the whole snapshot for an empty subpath
    pub fn get<S: AsRef<str>>(
        &self,
        subpath: &[S],
    ) -> Option<&Value> {
        value_at(&self.snapshot, subpath)
    }

    /// Set `subpath` to `value`, creating intermediate objects as needed
    pub fn set<S: AsRef<str>>(
        &mut self,
        subpath: &[S],
        value: Value,
    ) -> Result<()> {
        set_value(&mut self.snapshot, subpath, value)
    }

    /// Remove the value at `subpath`; absent paths are a silent no-op
    pub fn del<S: AsRef<str>>(
        &mut self,
        subpath: &[S],
    ) {
        del_value(&mut self.snapshot, subpath)
    }
}
