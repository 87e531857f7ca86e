use serde_json::json;

use crate::SyncDoc;
use crate::test_utils::test_model;
use crate::ChangeKind;
use crate::Error;
use crate::Model;
use crate::StoreError;

#[test]
fn test_set_and_get_on_local_collection() {
    let (model, _) = test_model();
    model.set(&["_page", "1", "title"], json!("home")).expect("set");

    assert_eq!(model.get(&["_page", "1", "title"]), Some(json!("home")));
    assert_eq!(model.get(&["_page", "1"]), Some(json!({"title": "home"})));
    assert_eq!(model.get(&["_page"]), Some(json!({"1": {"title": "home"}})));
    assert_eq!(model.get(&["_page", "1", "missing"]), None);
}

#[test]
fn test_get_whole_store() {
    let (model, _) = test_model();
    model.set(&["_page", "1", "x"], json!(1)).expect("set");
    model.set(&["_todo", "1", "y"], json!(2)).expect("set");

    assert_eq!(
        model.get::<&str>(&[]),
        Some(json!({"_page": {"1": {"x": 1}}, "_todo": {"1": {"y": 2}}}))
    );
}

#[test]
fn test_set_on_remote_collection_submits_pending_op() {
    let (model, connection) = test_model();
    model.set(&["users", "5", "name"], json!("alice")).expect("set");

    let share = connection.doc("users", "5").expect("doc created through the connection");
    assert!(share.has_pending());
    assert_eq!(model.get(&["users", "5", "name"]), Some(json!("alice")));

    share.ack_one();
    assert!(!share.has_pending());
}

#[test]
fn test_mutation_path_requires_collection_and_id() {
    let (model, _) = test_model();

    let err = model.set(&["users"], json!(1)).expect_err("collection-level set");
    assert!(matches!(err, Error::Store(StoreError::InvalidPath { .. })));

    let err = model.del::<&str>(&[]).expect_err("root del");
    assert!(matches!(err, Error::Store(StoreError::InvalidPath { .. })));
}

#[test]
fn test_del_document_prunes_empty_collection() {
    let (model, _) = test_model();
    model.set(&["_page", "1", "x"], json!(1)).expect("set");
    model.set(&["_page", "2", "x"], json!(2)).expect("set");

    model.del(&["_page", "1"]).expect("del");
    assert_eq!(model.get(&["_page"]), Some(json!({"2": {"x": 2}})));

    model.del(&["_page", "2"]).expect("del");
    assert_eq!(model.get(&["_page"]), None);
}

#[test]
fn test_del_on_missing_entries_is_a_silent_noop() {
    let (model, _) = test_model();

    model.del(&["_page", "1"]).expect("missing doc");
    model.del(&["_page", "1", "deep"]).expect("missing subpath");

    assert_eq!(model.get(&["_page"]), None);
}

#[test]
fn test_add_generates_id_and_writes_it_into_the_document() {
    let (model, _) = test_model();
    let id = model.add("_todo", json!({"label": "write tests"})).expect("add");

    let doc = model.get(&["_todo", id.as_str()]).expect("doc exists");
    assert_eq!(doc["label"], json!("write tests"));
    assert_eq!(doc["id"], json!(id));
}

#[test]
fn test_generated_ids_are_unique() {
    assert_ne!(Model::id(), Model::id());
}

#[test]
fn test_subscribe_receives_mutations_at_ancestors_and_descendants() {
    let (model, _) = test_model();
    let mut at_doc = model.subscribe(&["_page", "1"]);
    let mut at_field = model.subscribe(&["_page", "1", "title"]);
    let mut at_sibling = model.subscribe(&["_page", "2"]);

    model.set(&["_page", "1", "title"], json!("home")).expect("set");

    // the mutated path's ancestor sees the event
    let event = at_doc.try_recv().expect("ancestor notified");
    assert_eq!(event.kind, ChangeKind::Set);
    assert_eq!(event.path, vec!["_page", "1", "title"]);
    assert_eq!(event.value, Some(json!("home")));
    // so does the listener exactly at the mutated path
    assert!(at_field.try_recv().is_some());
    // sibling documents are never notified
    assert!(at_sibling.try_recv().is_none());

    // a doc-level mutation reaches the descendant field listener too
    model.set(&["_page", "1"], json!({"title": "other"})).expect("set");
    assert!(at_doc.try_recv().is_some());
    assert!(at_field.try_recv().is_some());
}

#[test]
fn test_del_notifies_affected_listeners() {
    let (model, _) = test_model();
    model.set(&["_page", "1", "title"], json!("home")).expect("set");
    let mut at_doc = model.subscribe(&["_page", "1"]);

    model.del(&["_page", "1", "title"]).expect("del");

    let event = at_doc.try_recv().expect("del notified");
    assert_eq!(event.kind, ChangeKind::Del);
    assert_eq!(event.value, None);
}

#[test]
fn test_unsubscribe_is_idempotent() {
    let (model, _) = test_model();
    let mut sub = model.subscribe(&["_page", "1"]);

    model.unsubscribe(&sub);
    model.unsubscribe(&sub);

    model.set(&["_page", "1", "x"], json!(1)).expect("set");
    assert!(sub.try_recv().is_none());
}

#[test]
fn test_unsubscribe_all_drops_descendant_subscriptions() {
    let (model, _) = test_model();
    let mut at_doc = model.subscribe(&["_page", "1"]);
    let mut at_field = model.subscribe(&["_page", "1", "title"]);

    model.unsubscribe_all(&["_page"]);
    model.set(&["_page", "1", "title"], json!("home")).expect("set");

    assert!(at_doc.try_recv().is_none());
    assert!(at_field.try_recv().is_none());
}

#[test]
fn test_fetch_and_subscribe_refcounts() {
    let (model, _) = test_model();
    model.fetch_doc("users", "5");
    model.fetch_doc("users", "5");
    model.subscribe_doc("users", "6");

    model.unfetch_doc("users", "5");
    assert_eq!(
        model.fetched_docs.read().get("users").and_then(|ids| ids.get("5")),
        Some(&1)
    );

    model.unfetch_doc("users", "5");
    assert!(model.fetched_docs.read().is_empty());

    model.unsubscribe_doc("users", "6");
    assert!(model.subscribed_docs.read().is_empty());

    // decrementing a count that was never taken is a no-op
    model.unfetch_doc("users", "nope");
}
