//! Shared test fixtures.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::doc::del_value;
use crate::doc::set_value;
use crate::ChangeKind;
use crate::DocOp;
use crate::Model;
use crate::Result;
use crate::Settings;
use crate::SyncConnection;
use crate::SyncDoc;

/// In-memory stand-in for the OT document layer: submitted ops stay pending
/// until acknowledged; quiescence waiters fire once the pending count hits
/// zero.
pub(crate) struct FakeSyncDoc {
    version: AtomicU64,
    state: Mutex<FakeDocState>,
}

struct FakeDocState {
    snapshot: Value,
    pending: u32,
    waiters: Vec<oneshot::Sender<()>>,
}

impl FakeSyncDoc {
    pub(crate) fn new(
        version: u64,
        snapshot: Value,
    ) -> Arc<Self> {
        Arc::new(Self {
            version: AtomicU64::new(version),
            state: Mutex::new(FakeDocState {
                snapshot,
                pending: 0,
                waiters: Vec::new(),
            }),
        })
    }

    /// Mark one op in flight without going through `submit_op`
    pub(crate) fn begin_pending(&self) {
        self.state.lock().pending += 1;
    }

    /// Acknowledge one op; fires quiescence waiters at zero
    pub(crate) fn ack_one(&self) {
        self.version.fetch_add(1, Ordering::Relaxed);
        let waiters = {
            let mut state = self.state.lock();
            state.pending = state.pending.saturating_sub(1);
            if state.pending == 0 {
                std::mem::take(&mut state.waiters)
            } else {
                Vec::new()
            }
        };
        for waiter in waiters {
            let _ = waiter.send(());
        }
    }
}

impl SyncDoc for FakeSyncDoc {
    fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }

    fn snapshot(&self) -> Value {
        self.state.lock().snapshot.clone()
    }

    fn has_pending(&self) -> bool {
        self.state.lock().pending > 0
    }

    fn on_quiescent(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock();
        if state.pending == 0 {
            let _ = tx.send(());
        } else {
            state.waiters.push(tx);
        }
        rx
    }

    fn submit_op(
        &self,
        op: DocOp,
    ) -> Result<()> {
        let mut state = self.state.lock();
        match op.kind {
            ChangeKind::Set => {
                set_value(&mut state.snapshot, &op.subpath, op.value.unwrap_or(Value::Null))?
            }
            ChangeKind::Del => del_value(&mut state.snapshot, &op.subpath),
        }
        state.pending += 1;
        Ok(())
    }
}

/// Hands out fake documents and remembers them so tests can drive acks
pub(crate) struct FakeConnection {
    docs: Mutex<BTreeMap<(String, String), Arc<FakeSyncDoc>>>,
}

impl FakeConnection {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            docs: Mutex::new(BTreeMap::new()),
        })
    }

    pub(crate) fn doc(
        &self,
        collection: &str,
        id: &str,
    ) -> Option<Arc<FakeSyncDoc>> {
        self.docs.lock().get(&(collection.to_string(), id.to_string())).cloned()
    }
}

impl SyncConnection for FakeConnection {
    fn get_doc(
        &self,
        collection: &str,
        id: &str,
    ) -> Arc<dyn SyncDoc> {
        let mut docs = self.docs.lock();
        docs.entry((collection.to_string(), id.to_string()))
            .or_insert_with(|| FakeSyncDoc::new(0, Value::Null))
            .clone()
    }
}

/// Model wired to a fake connection with default settings
pub(crate) fn test_model() -> (Model, Arc<FakeConnection>) {
    let connection = FakeConnection::new();
    let model = Model::new(connection.clone(), Settings::default());
    (model, connection)
}
