use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::json;

use super::when_nothing_pending;
use crate::test_utils::test_model;

#[tokio::test]
async fn test_resolves_immediately_without_pending_docs() {
    let (model, _) = test_model();
    model.set(&["_local", "1", "x"], json!(1)).expect("set");

    when_nothing_pending(&model).await;
}

#[tokio::test]
async fn test_resolves_immediately_on_an_empty_model() {
    let (model, _) = test_model();

    when_nothing_pending(&model).await;
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_every_pending_doc_in_any_ack_order() {
    let (model, connection) = test_model();
    for id in ["1", "2", "3"] {
        model.set(&["users", id, "x"], json!(id)).expect("set");
    }

    let done = Arc::new(AtomicBool::new(false));
    // one acknowledging task per doc, in an order unrelated to the scan
    let mut drivers = Vec::new();
    for (index, id) in ["2", "3", "1"].iter().enumerate() {
        let doc = connection.doc("users", id).expect("doc");
        let last_acked = done.clone();
        drivers.push(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10 * (index as u64 + 1))).await;
            if index == 2 {
                last_acked.store(true, Ordering::SeqCst);
            }
            doc.ack_one();
        }));
    }

    when_nothing_pending(&model).await;

    assert!(done.load(Ordering::SeqCst), "barrier resolved before the last ack");
    join_all(drivers).await;
}

#[tokio::test(start_paused = true)]
async fn test_rescans_everything_after_each_wakeup() {
    let (model, connection) = test_model();
    model.set(&["users", "a", "x"], json!(1)).expect("set");
    model.set(&["users", "b", "x"], json!(1)).expect("set");
    let doc_a = connection.doc("users", "a").expect("doc a");
    let doc_b = connection.doc("users", "b").expect("doc b");
    doc_b.ack_one();

    let done = Arc::new(AtomicBool::new(false));
    let finished = done.clone();
    let driver = tokio::spawn(async move {
        // while the barrier waits on "a", "b" becomes pending again; only a
        // full rescan after the wakeup notices it
        tokio::time::sleep(Duration::from_millis(5)).await;
        doc_b.begin_pending();
        doc_a.ack_one();

        tokio::time::sleep(Duration::from_millis(5)).await;
        finished.store(true, Ordering::SeqCst);
        doc_b.ack_one();
    });

    when_nothing_pending(&model).await;

    assert!(done.load(Ordering::SeqCst), "barrier resolved before doc b settled");
    driver.await.expect("driver");
}
