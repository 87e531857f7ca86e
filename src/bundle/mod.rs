//! Quiescence-gated export of the model's full state.
//!
//! `bundle()` waits until no document has an unacknowledged op in flight,
//! serializes every collection, and permanently disables further local
//! mutation. The wait races a configurable deadline; timing out leaves the
//! model untouched and mutable.

mod quiescence;
mod serializer;

pub(crate) use quiescence::*;
pub(crate) use serializer::*;

#[cfg(test)]
mod quiescence_test;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;
use tracing::instrument;
use tracing::warn;

use crate::BundleError;
use crate::Model;
use crate::Result;

/// Per-document serialized form: synchronized documents carry their
/// version, local documents serialize as the bare snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DocSnapshot {
    Versioned { v: u64, snapshot: Value },
    Raw(Value),
}

/// Immutable point-in-time export of the whole model, produced at most once
/// per model instance
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub collections: BTreeMap<String, BTreeMap<String, DocSnapshot>>,
    /// Owned by the query layer; serialized opaquely
    pub queries: Value,
    pub fetched_docs: BTreeMap<String, BTreeMap<String, u32>>,
    pub subscribed_docs: BTreeMap<String, BTreeMap<String, u32>>,
    /// Owned by the ref layers; serialized opaquely
    pub refs: Value,
    pub ref_lists: Value,
}

impl Model {
    /// Bundle with the configured deadline
    pub async fn bundle(&self) -> Result<Bundle> {
        self.bundle_within(Duration::from_millis(self.settings.bundle.timeout_ms)).await
    }

    /// Wait (up to `deadline`) for every document to settle, then serialize
    /// the model and permanently disable further local mutation.
    ///
    /// Exactly one of {timeout error, bundle} is produced per call. On
    /// timeout the model stays mutable and a later settlement has no effect:
    /// the barrier future is dropped with the race. Once a bundle has been
    /// produced, later calls fail the same way mutations do.
    #[instrument(skip(self))]
    pub async fn bundle_within(
        &self,
        deadline: Duration,
    ) -> Result<Bundle> {
        if self.commit.load().terminal {
            return Err(BundleError::MutationAfterBundle.into());
        }
        if timeout(deadline, when_nothing_pending(self)).await.is_err() {
            warn!(?deadline, "bundle deadline elapsed before quiescence");
            return Err(BundleError::Timeout(deadline).into());
        }
        let bundle = Bundle {
            collections: serialize_collections(self),
            queries: Value::Object(Map::new()),
            fetched_docs: self.fetched_docs.read().clone(),
            subscribed_docs: self.subscribed_docs.read().clone(),
            refs: Value::Object(Map::new()),
            ref_lists: Value::Object(Map::new()),
        };
        self.freeze_commit();
        debug!(
            collections = bundle.collections.len(),
            "model bundled; further mutation disabled"
        );
        Ok(bundle)
    }
}
