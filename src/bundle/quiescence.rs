//! Level-triggered barrier over every document's pending state.

use tokio::sync::oneshot;
use tracing::trace;

use crate::Doc;
use crate::Model;

/// Resolve once no document in the model has an unacknowledged op in
/// flight.
///
/// Whenever a pending document is found the barrier waits for that
/// document's one-shot quiescence signal and then rescans every document
/// from scratch: a mutation made from an event callback while waiting can
/// make any other document newly pending, so partial scan state cannot be
/// trusted.
pub(crate) async fn when_nothing_pending(model: &Model) {
    loop {
        match first_pending_waiter(model) {
            Some(waiter) => {
                // A dropped sender also wakes us; the rescan re-verifies
                let _ = waiter.await;
            }
            None => return,
        }
    }
}

/// One-shot settle signal for the first pending document found, if any.
/// The receiver is taken out of the scan so no lock is held while awaiting.
fn first_pending_waiter(model: &Model) -> Option<oneshot::Receiver<()>> {
    let collections = model.collections.read();
    for (name, collection) in collections.iter() {
        for (id, doc) in collection.docs.iter() {
            if let Doc::Remote(remote) = doc {
                if remote.share().has_pending() {
                    trace!(
                        collection = name.as_str(),
                        id = id.as_str(),
                        "document has pending ops; waiting"
                    );
                    return Some(remote.share().on_quiescent());
                }
            }
        }
    }
    None
}
