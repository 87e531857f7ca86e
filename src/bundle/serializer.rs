//! Walks the live store into plain, deeply-comparable snapshot maps.

use std::collections::BTreeMap;

use super::DocSnapshot;
use crate::Doc;
use crate::Model;

/// Serialize every collection. The returned maps are freshly built and
/// share no mutable state with the live store.
pub(crate) fn serialize_collections(model: &Model) -> BTreeMap<String, BTreeMap<String, DocSnapshot>> {
    let collections = model.collections.read();
    let mut out = BTreeMap::new();
    for (name, collection) in collections.iter() {
        let mut docs = BTreeMap::new();
        for (id, doc) in collection.docs.iter() {
            let snapshot = match doc {
                Doc::Remote(remote) => DocSnapshot::Versioned {
                    v: remote.version(),
                    snapshot: remote.snapshot(),
                },
                Doc::Local(local) => DocSnapshot::Raw(local.snapshot().clone()),
            };
            docs.insert(id.clone(), snapshot);
        }
        out.insert(name.clone(), docs);
    }
    out
}
