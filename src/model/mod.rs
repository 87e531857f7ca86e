//! The reactive model: document store, path listeners, mutation entry.

mod collections;
pub(crate) use collections::*;

#[cfg(test)]
mod model_test;

use std::collections::BTreeMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use serde_json::Map;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::warn;

use crate::BundleError;
use crate::ChangeEvent;
use crate::ChangeKind;
use crate::ChangeListener;
use crate::ChangeSubscription;
use crate::Doc;
use crate::DocOp;
use crate::Error;
use crate::ListenerTree;
use crate::LocalDoc;
use crate::ModelEvent;
use crate::RemoteDoc;
use crate::Result;
use crate::Settings;
use crate::StoreError;
use crate::SyncConnection;

const MODEL_EVENT_CAPACITY: usize = 64;

/// The model's mutation entry point. Every `set`/`del` goes through the
/// currently-installed path; bundling atomically swaps it for a terminal
/// path that rejects everything, which is what enforces bundle exclusivity
/// (components bypassing this entry point are out of contract).
pub(crate) struct CommitPath {
    pub(crate) terminal: bool,
    handler: Box<dyn Fn(&Model, &ChangeEvent) -> Result<()> + Send + Sync>,
}

impl CommitPath {
    fn live() -> Self {
        Self {
            terminal: false,
            handler: Box::new(|model, change| model.apply(change)),
        }
    }

    fn terminal(events: broadcast::Sender<ModelEvent>) -> Self {
        Self {
            terminal: true,
            handler: Box::new(move |_model, _change| {
                warn!("model mutation performed after bundling");
                let error = Arc::new(Error::Bundle(BundleError::MutationAfterBundle));
                let _ = events.send(ModelEvent::Error(error));
                Err(BundleError::MutationAfterBundle.into())
            }),
        }
    }

    pub(crate) fn commit(
        &self,
        model: &Model,
        change: &ChangeEvent,
    ) -> Result<()> {
        (self.handler)(model, change)
    }
}

/// A client- or server-side data model instance: a path-addressed document
/// store whose mutations notify exactly the interested listeners, and whose
/// state can be exported once through [`Model::bundle`].
pub struct Model {
    pub(crate) settings: Settings,
    connection: Arc<dyn SyncConnection>,
    pub(crate) collections: RwLock<BTreeMap<String, Collection>>,
    listeners: RwLock<ListenerTree<ChangeListener>>,
    pub(crate) commit: ArcSwap<CommitPath>,
    events: broadcast::Sender<ModelEvent>,
    pub(crate) fetched_docs: RwLock<BTreeMap<String, BTreeMap<String, u32>>>,
    pub(crate) subscribed_docs: RwLock<BTreeMap<String, BTreeMap<String, u32>>>,
    next_listener_id: AtomicU64,
}

impl Model {
    pub fn new(
        connection: Arc<dyn SyncConnection>,
        settings: Settings,
    ) -> Self {
        let (events, _) = broadcast::channel(MODEL_EVENT_CAPACITY);
        Self {
            settings,
            connection,
            collections: RwLock::new(BTreeMap::new()),
            listeners: RwLock::new(ListenerTree::new()),
            commit: ArcSwap::from_pointee(CommitPath::live()),
            events,
            fetched_docs: RwLock::new(BTreeMap::new()),
            subscribed_docs: RwLock::new(BTreeMap::new()),
            next_listener_id: AtomicU64::new(1),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Unique document id (URL-safe, collision resistant)
    pub fn id() -> String {
        nanoid::nanoid!()
    }

    //--- Mutation entry points

    /// Set the value at `path` (collection, document id, then subpath),
    /// creating the collection and document on demand, then notify every
    /// affected listener.
    pub fn set<S: AsRef<str>>(
        &self,
        path: &[S],
        value: Value,
    ) -> Result<()> {
        self.mutate(ChangeEvent::set(owned_segments(path), value))
    }

    /// Delete the value at `path`; a document-level path removes the whole
    /// document (pruning the collection once empty). Notifies every
    /// affected listener.
    pub fn del<S: AsRef<str>>(
        &self,
        path: &[S],
    ) -> Result<()> {
        self.mutate(ChangeEvent::del(owned_segments(path)))
    }

    /// Add a document with a generated id to `collection`; returns the id.
    /// An object value gets the id written into its `id` field.
    pub fn add(
        &self,
        collection: &str,
        mut data: Value,
    ) -> Result<String> {
        let id = Self::id();
        if let Value::Object(map) = &mut data {
            map.insert("id".to_string(), Value::String(id.clone()));
        }
        self.set(&[collection, id.as_str()], data)?;
        Ok(id)
    }

    fn mutate(
        &self,
        change: ChangeEvent,
    ) -> Result<()> {
        self.commit.load().commit(self, &change)?;
        self.notify_affected(&change);
        Ok(())
    }

    /// Apply a mutation to the store. This is what the live commit path
    /// points at; after bundling nothing calls it anymore.
    fn apply(
        &self,
        change: &ChangeEvent,
    ) -> Result<()> {
        let (collection_name, id, subpath) = split_doc_path(&change.path)?;
        match change.kind {
            ChangeKind::Set => {
                let value = change.value.clone().unwrap_or(Value::Null);
                self.with_doc_mut(collection_name, id, |doc| match doc {
                    Doc::Local(local) => local.set(subpath, value),
                    Doc::Remote(remote) => remote.share().submit_op(DocOp::set(owned_segments(subpath), value)),
                })
            }
            ChangeKind::Del => {
                if subpath.is_empty() {
                    self.remove_doc(collection_name, id);
                    return Ok(());
                }
                let mut collections = self.collections.write();
                let doc = collections
                    .get_mut(collection_name)
                    .and_then(|collection| collection.docs.get_mut(id));
                match doc {
                    Some(Doc::Local(local)) => {
                        local.del(subpath);
                        Ok(())
                    }
                    Some(Doc::Remote(remote)) => remote.share().submit_op(DocOp::del(owned_segments(subpath))),
                    // Deleting from a missing document is a silent no-op
                    None => Ok(()),
                }
            }
        }
    }

    fn notify_affected(
        &self,
        change: &ChangeEvent,
    ) {
        let affected = self.listeners.read().affected_listeners(&change.path);
        debug!(
            path = change.path.join(".").as_str(),
            listeners = affected.len(),
            "notifying affected listeners"
        );
        for listener in affected {
            listener.notify(change.clone());
        }
    }

    //--- Store reads

    /// Value at `path`: the whole store (empty path), one collection, or a
    /// document subpath. `None` when nothing exists there.
    pub fn get<S: AsRef<str>>(
        &self,
        path: &[S],
    ) -> Option<Value> {
        let collections = self.collections.read();
        let (collection_name, rest) = match path.split_first() {
            Some(split) => split,
            None => {
                let mut out = Map::new();
                for (name, collection) in collections.iter() {
                    out.insert(name.clone(), collection.get());
                }
                return Some(Value::Object(out));
            }
        };
        let collection = collections.get(collection_name.as_ref())?;
        match rest.split_first() {
            None => Some(collection.get()),
            Some((id, subpath)) => collection.docs.get(id.as_ref())?.get(subpath),
        }
    }

    /// Clone of the document entry at `collection`/`id`, if present
    pub fn get_doc(
        &self,
        collection: &str,
        id: &str,
    ) -> Option<Doc> {
        self.collections.read().get(collection)?.docs.get(id).cloned()
    }

    /// Snapshot view of a whole collection, if present
    pub fn get_collection(
        &self,
        name: &str,
    ) -> Option<Value> {
        Some(self.collections.read().get(name)?.get())
    }

    //--- Document CRUD

    /// Create the collection and document on demand, then run `mutate` on
    /// the entry. Whether the new document is local or synchronized is
    /// decided by the collection name.
    fn with_doc_mut<R>(
        &self,
        collection_name: &str,
        id: &str,
        mutate: impl FnOnce(&mut Doc) -> R,
    ) -> R {
        let mut collections = self.collections.write();
        let collection = collections.entry(collection_name.to_string()).or_insert_with(Collection::new);
        let doc = collection
            .docs
            .entry(id.to_string())
            .or_insert_with(|| self.new_doc(collection_name, id));
        mutate(doc)
    }

    fn new_doc(
        &self,
        collection_name: &str,
        id: &str,
    ) -> Doc {
        if is_local_collection(collection_name) {
            Doc::Local(LocalDoc::new(collection_name, id, Value::Null))
        } else {
            let share = self.connection.get_doc(collection_name, id);
            Doc::Remote(RemoteDoc::new(collection_name, id, share))
        }
    }

    /// Remove a document; drops the collection once its last document is
    /// removed. Missing entries are silent no-ops.
    pub(crate) fn remove_doc(
        &self,
        collection_name: &str,
        id: &str,
    ) {
        let mut collections = self.collections.write();
        let emptied = match collections.get_mut(collection_name) {
            Some(collection) => {
                collection.docs.remove(id);
                collection.docs.is_empty()
            }
            None => return,
        };
        if emptied {
            collections.remove(collection_name);
        }
    }

    //--- Path subscriptions

    /// Register for change events at `path`. The subscription observes every
    /// mutation whose affected set includes this path: mutations at the path
    /// itself, at any ancestor, and at any descendant.
    pub fn subscribe<S: AsRef<str>>(
        &self,
        path: &[S],
    ) -> ChangeSubscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = ChangeListener::new(id, tx);
        let path = owned_segments(path);
        self.listeners.write().add_listener(&path, listener.clone());
        ChangeSubscription { listener, path, rx }
    }

    /// Remove one subscription; removing twice is a silent no-op
    pub fn unsubscribe(
        &self,
        subscription: &ChangeSubscription,
    ) {
        self.listeners.write().remove_listener(&subscription.path, &subscription.listener);
    }

    /// Drop every subscription registered at or below `path`
    pub fn unsubscribe_all<S: AsRef<str>>(
        &self,
        path: &[S],
    ) {
        self.listeners.write().remove_all_listeners(path);
    }

    /// Subscribe to out-of-band model events (asynchronous error reports)
    pub fn events(&self) -> broadcast::Receiver<ModelEvent> {
        self.events.subscribe()
    }

    //--- Sync bookkeeping

    /// Record a fetch of `collection`/`id` (reference counted)
    pub fn fetch_doc(
        &self,
        collection: &str,
        id: &str,
    ) {
        bump(&mut self.fetched_docs.write(), collection, id);
    }

    pub fn unfetch_doc(
        &self,
        collection: &str,
        id: &str,
    ) {
        unbump(&mut self.fetched_docs.write(), collection, id);
    }

    /// Record a subscription to `collection`/`id` (reference counted)
    pub fn subscribe_doc(
        &self,
        collection: &str,
        id: &str,
    ) {
        bump(&mut self.subscribed_docs.write(), collection, id);
    }

    pub fn unsubscribe_doc(
        &self,
        collection: &str,
        id: &str,
    ) {
        unbump(&mut self.subscribed_docs.write(), collection, id);
    }

    //--- Bundling support

    /// Swap the mutation entry point for the terminal rejecting path. Every
    /// later `set`/`del` fails with [`BundleError::MutationAfterBundle`] and
    /// emits the same error as a [`ModelEvent`].
    pub(crate) fn freeze_commit(&self) {
        self.commit.store(Arc::new(CommitPath::terminal(self.events.clone())));
    }
}

fn split_doc_path(path: &[String]) -> Result<(&str, &str, &[String])> {
    if let [collection, id, subpath @ ..] = path {
        return Ok((collection.as_str(), id.as_str(), subpath));
    }
    Err(StoreError::InvalidPath { path: path.join(".") }.into())
}

fn owned_segments<S: AsRef<str>>(segments: &[S]) -> Vec<String> {
    segments.iter().map(|segment| segment.as_ref().to_string()).collect()
}

fn bump(
    counts: &mut BTreeMap<String, BTreeMap<String, u32>>,
    collection: &str,
    id: &str,
) {
    *counts
        .entry(collection.to_string())
        .or_default()
        .entry(id.to_string())
        .or_insert(0) += 1;
}

fn unbump(
    counts: &mut BTreeMap<String, BTreeMap<String, u32>>,
    collection: &str,
    id: &str,
) {
    let emptied = match counts.get_mut(collection) {
        Some(ids) => {
            if let Some(count) = ids.get_mut(id) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    ids.remove(id);
                }
            }
            ids.is_empty()
        }
        None => return,
    };
    if emptied {
        counts.remove(collection);
    }
}
