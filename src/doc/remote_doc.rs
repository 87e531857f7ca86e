//! Synchronized document: a thin handle over the OT document boundary.

use std::fmt::Debug;
use std::sync::Arc;

use serde_json::Value;

use super::value_at;
use super::SyncDoc;

#[derive(Clone)]
pub struct RemoteDoc {
    collection: String,
    id: String,
    share: Arc<dyn SyncDoc>,
}

impl Debug for RemoteDoc {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RemoteDoc")
            .field("collection", &self.collection)
            .field("id", &self.id)
            .finish()
    }
}

impl RemoteDoc {
    pub(crate) fn new(
        collection: &str,
        id: &str,
        share: Arc<dyn SyncDoc>,
    ) -> Self {
        Self {
            collection: collection.to_string(),
            id: id.to_string(),
            share,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> u64 {
        self.share.version()
    }

    pub fn snapshot(&self) -> Value {
        self.share.snapshot()
    }

    pub(crate) fn share(&self) -> &Arc<dyn SyncDoc> {
        &self.share
    }

    /// Value at `subpath` in the current snapshot
    pub fn get<S: AsRef<str>>(
        &self,
        subpath: &[S],
    ) -> Option<Value> {
        let snapshot = self.share.snapshot();
        value_at(&snapshot, subpath).cloned()
    }
}
