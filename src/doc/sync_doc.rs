//! Boundary contracts consumed from the synchronized-document layer.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::oneshot;

#[cfg(test)]
use mockall::automock;

use super::DocOp;
use crate::Result;

/// Contract the model consumes from the operational-transform document
/// layer. The OT merge algorithm, its transport and its version-vector
/// reconciliation all live behind this trait.
#[cfg_attr(test, automock)]
pub trait SyncDoc: Send + Sync {
    /// Version of the latest acknowledged snapshot
    fn version(&self) -> u64;

    /// Current snapshot value
    fn snapshot(&self) -> Value;

    /// Whether any submitted op is still unacknowledged
    fn has_pending(&self) -> bool;

    /// Single-fire notification for the next "nothing pending" transition.
    /// Only meaningful while `has_pending()` is true.
    fn on_quiescent(&self) -> oneshot::Receiver<()>;

    /// Submit a mutation op for transform and acknowledgement
    fn submit_op(
        &self,
        op: DocOp,
    ) -> Result<()>;
}

/// How the model obtains the synchronized document backing a remote doc
#[cfg_attr(test, automock)]
pub trait SyncConnection: Send + Sync {
    fn get_doc(
        &self,
        collection: &str,
        id: &str,
    ) -> Arc<dyn SyncDoc>;
}
