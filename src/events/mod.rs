//! Change events, listener handles and path subscriptions.

mod listener_tree;
pub use listener_tree::*;


use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::Error;

/// Mutation kinds reported to path listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Set,
    Del,
}

/// A mutation notification delivered to affected path listeners.
///
/// Also doubles as the mutation descriptor handed to the model's commit
/// path, so what the commit applies and what listeners observe is the same
/// value by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Full mutation path: collection, document id, then the subpath
    pub path: Vec<String>,
    pub kind: ChangeKind,
    /// New value for `Set`, `None` for `Del`
    pub value: Option<Value>,
}

impl ChangeEvent {
    pub fn set(
        path: Vec<String>,
        value: Value,
    ) -> Self {
        Self {
            path,
            kind: ChangeKind::Set,
            value: Some(value),
        }
    }

    pub fn del(path: Vec<String>) -> Self {
        Self {
            path,
            kind: ChangeKind::Del,
            value: None,
        }
    }
}

/// Out-of-band model events, delivered on the model's broadcast channel
#[derive(Debug, Clone)]
pub enum ModelEvent {
    /// Asynchronous error report, e.g. a mutation attempted after bundling
    Error(Arc<Error>),
}

/// Handle registered in the listener tree. Identity (and thus registration
/// idempotence) is the numeric id, not the channel endpoint.
#[derive(Debug, Clone)]
pub struct ChangeListener {
    id: u64,
    tx: mpsc::UnboundedSender<ChangeEvent>,
}

impl ChangeListener {
    pub(crate) fn new(
        id: u64,
        tx: mpsc::UnboundedSender<ChangeEvent>,
    ) -> Self {
        Self { id, tx }
    }

    /// Delivery to a dropped subscriber is a silent no-op
    pub(crate) fn notify(
        &self,
        event: ChangeEvent,
    ) {
        let _ = self.tx.send(event);
    }
}

impl PartialEq for ChangeListener {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.id == other.id
    }
}

/// A live path subscription returned by [`crate::Model::subscribe`]
pub struct ChangeSubscription {
    pub(crate) listener: ChangeListener,
    pub(crate) path: Vec<String>,
    pub(crate) rx: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl ChangeSubscription {
    /// Path this subscription was registered at
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Receive the next change event; `None` once the model is gone
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Non-blocking receive; `None` when no event is queued
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }

    /// Consume the subscription as a [`tokio_stream::Stream`] of events
    pub fn into_stream(self) -> UnboundedReceiverStream<ChangeEvent> {
        UnboundedReceiverStream::new(self.rx)
    }
}
