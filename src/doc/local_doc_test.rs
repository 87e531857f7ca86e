use serde_json::json;
use serde_json::Value;

use crate::Error;
use crate::LocalDoc;
use crate::StoreError;

fn doc(data: Value) -> LocalDoc {
    LocalDoc::new("_page", "1", data)
}

#[test]
fn test_set_and_get_nested_value() {
    let mut doc = doc(Value::Null);
    doc.set(&["profile", "name"], json!("alice")).expect("set");

    assert_eq!(doc.get(&["profile", "name"]), Some(&json!("alice")));
    assert_eq!(doc.get(&["profile"]), Some(&json!({"name": "alice"})));
    assert_eq!(doc.get(&["missing"]), None);
}

#[test]
fn test_empty_subpath_replaces_snapshot() {
    let mut doc = doc(json!({"old": true}));
    doc.set::<&str>(&[], json!({"new": true})).expect("set");

    assert_eq!(doc.snapshot(), &json!({"new": true}));
}

#[test]
fn test_set_creates_intermediate_objects() {
    let mut doc = doc(Value::Null);
    doc.set(&["a", "b", "c"], json!(1)).expect("set");

    assert_eq!(doc.snapshot(), &json!({"a": {"b": {"c": 1}}}));
}

#[test]
fn test_set_through_scalar_ancestor_fails() {
    let mut doc = doc(json!({"a": 42}));
    let err = doc.set(&["a", "b"], json!(1)).expect_err("must fail");

    assert!(matches!(err, Error::Store(StoreError::NonObjectAncestor { .. })));
    // the snapshot is untouched on failure
    assert_eq!(doc.snapshot(), &json!({"a": 42}));
}

#[test]
fn test_array_index_access() {
    let mut doc = doc(json!({"items": ["a", "b"]}));

    assert_eq!(doc.get(&["items", "1"]), Some(&json!("b")));

    doc.set(&["items", "1"], json!("c")).expect("replace");
    doc.set(&["items", "2"], json!("d")).expect("append");
    assert_eq!(doc.get(&["items"]), Some(&json!(["a", "c", "d"])));

    doc.del(&["items", "0"]);
    assert_eq!(doc.get(&["items"]), Some(&json!(["c", "d"])));
}

#[test]
fn test_set_array_index_out_of_bounds_fails() {
    let mut doc = doc(json!({"items": ["a"]}));

    assert!(doc.set(&["items", "5"], json!("x")).is_err());
    assert!(doc.set(&["items", "nope"], json!("x")).is_err());
}

#[test]
fn test_del_is_a_silent_noop_on_missing_paths() {
    let mut doc = doc(json!({"a": {"b": 1}}));

    doc.del(&["a", "missing"]);
    doc.del(&["missing", "deeper"]);

    assert_eq!(doc.snapshot(), &json!({"a": {"b": 1}}));
}

#[test]
fn test_del_removes_nested_value() {
    let mut doc = doc(json!({"a": {"b": 1, "c": 2}}));

    doc.del(&["a", "b"]);

    assert_eq!(doc.snapshot(), &json!({"a": {"c": 2}}));
}

#[test]
fn test_del_empty_subpath_clears_snapshot() {
    let mut doc = doc(json!({"a": 1}));

    doc.del::<&str>(&[]);

    assert_eq!(doc.snapshot(), &Value::Null);
}
