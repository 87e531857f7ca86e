//! Hierarchical path-indexed listener registry.
//!
//! A trie over path segments mapping arbitrary path prefixes to listener
//! values. Nodes are materialized lazily on registration and pruned the
//! moment their listener set and child set are both empty, so a long-lived
//! model with many transient subscriptions does not accumulate dead nodes.
//!
//! Nodes live in an arena indexed by `u32` id; parent and child edges are
//! ids, never owning references. The root occupies slot 0 and is never
//! freed: when the whole tree empties the root is cleared in place.

use std::collections::BTreeMap;

type NodeId = u32;

const ROOT: NodeId = 0;

#[derive(Debug)]
struct TreeNode<L> {
    /// Navigational edge for upward pruning; `None` for the root
    parent: Option<NodeId>,
    /// Last path segment this node represents; `None` for the root
    segment: Option<String>,
    /// `None` when empty, never an allocated-but-empty map. Emptiness vs
    /// absence is how pruning decides when a node dies.
    children: Option<BTreeMap<String, NodeId>>,
    /// Same absent-vs-empty invariant as `children`; insertion order kept
    listeners: Option<Vec<L>>,
}

impl<L> TreeNode<L> {
    fn root() -> Self {
        Self {
            parent: None,
            segment: None,
            children: None,
            listeners: None,
        }
    }

    fn child(
        parent: NodeId,
        segment: &str,
    ) -> Self {
        Self {
            parent: Some(parent),
            segment: Some(segment.to_string()),
            children: None,
            listeners: None,
        }
    }
}

/// Path-segment trie of listener values.
///
/// Listener values are consumer-supplied; `PartialEq` defines registration
/// identity, and queries hand back owned copies so callers can never corrupt
/// tree state through a returned set. Segments are taken as slices and never
/// re-split, so a segment may itself contain any delimiter characters.
#[derive(Debug)]
pub struct ListenerTree<L> {
    nodes: Vec<Option<TreeNode<L>>>,
    free: Vec<NodeId>,
}

impl<L> Default for ListenerTree<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> ListenerTree<L> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(TreeNode::root())],
            free: Vec::new(),
        }
    }

    /// Number of live nodes, the root included
    #[cfg(test)]
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    fn node(
        &self,
        id: NodeId,
    ) -> Option<&TreeNode<L>> {
        self.nodes.get(id as usize)?.as_ref()
    }

    fn node_mut(
        &mut self,
        id: NodeId,
    ) -> Option<&mut TreeNode<L>> {
        self.nodes.get_mut(id as usize)?.as_mut()
    }

    fn alloc(
        &mut self,
        node: TreeNode<L>,
    ) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id as usize] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                (self.nodes.len() - 1) as NodeId
            }
        }
    }

    /// Pure descent; `None` when any segment has no node
    fn find<S: AsRef<str>>(
        &self,
        segments: &[S],
    ) -> Option<NodeId> {
        let mut id = ROOT;
        for segment in segments {
            id = *self.node(id)?.children.as_ref()?.get(segment.as_ref())?;
        }
        Some(id)
    }

    /// Descend from the root, creating missing nodes lazily per segment
    fn find_or_create<S: AsRef<str>>(
        &mut self,
        segments: &[S],
    ) -> NodeId {
        let mut id = ROOT;
        for segment in segments {
            let segment = segment.as_ref();
            let existing = self
                .node(id)
                .and_then(|node| node.children.as_ref())
                .and_then(|children| children.get(segment))
                .copied();
            id = match existing {
                Some(child) => child,
                None => {
                    let child = self.alloc(TreeNode::child(id, segment));
                    if let Some(parent) = self.node_mut(id) {
                        parent
                            .children
                            .get_or_insert_with(BTreeMap::new)
                            .insert(segment.to_string(), child);
                    }
                    child
                }
            };
        }
        id
    }

    /// Free a node and every descendant back to the arena. Unreachable does
    /// not mean freed here, so destruction releases slots explicitly.
    fn release_subtree(
        &mut self,
        id: NodeId,
    ) {
        let node = match self.nodes.get_mut(id as usize).and_then(|slot| slot.take()) {
            Some(node) => node,
            None => return,
        };
        self.free.push(id);
        if let Some(children) = node.children {
            for (_, child) in children {
                self.release_subtree(child);
            }
        }
    }

    /// Destroy a node: free its whole subtree and unlink it from its parent,
    /// pruning emptied ancestors transitively. The root is cleared in place
    /// instead since it must stay reachable.
    fn destroy(
        &mut self,
        id: NodeId,
    ) {
        if id == ROOT {
            let children = match self.node_mut(ROOT) {
                Some(root) => {
                    root.listeners = None;
                    root.children.take()
                }
                None => None,
            };
            if let Some(children) = children {
                for (_, child) in children {
                    self.release_subtree(child);
                }
            }
            return;
        }
        let (parent, segment) = match self.node(id) {
            Some(node) => match (node.parent, node.segment.clone()) {
                (Some(parent), Some(segment)) => (parent, segment),
                _ => return,
            },
            None => return,
        };
        self.release_subtree(id);
        self.remove_child(parent, &segment);
    }

    /// Drop the child edge at `segment`; if that leaves the node with no
    /// children and no listeners, destroy it too (the upward pruning chain)
    fn remove_child(
        &mut self,
        id: NodeId,
        segment: &str,
    ) {
        let destroy_parent = match self.node_mut(id) {
            Some(node) => {
                let emptied = match node.children.as_mut() {
                    Some(children) => {
                        children.remove(segment);
                        children.is_empty()
                    }
                    None => return,
                };
                if !emptied {
                    return;
                }
                node.children = None;
                node.listeners.is_none()
            }
            None => return,
        };
        if destroy_parent {
            self.destroy(id);
        }
    }
}

impl<L: PartialEq> ListenerTree<L> {
    /// Register `listener` at the node for `segments`, creating nodes along
    /// the way as needed. Registering an identical listener twice at the
    /// same path has no effect.
    pub fn add_listener<S: AsRef<str>>(
        &mut self,
        segments: &[S],
        listener: L,
    ) {
        let id = self.find_or_create(segments);
        if let Some(node) = self.node_mut(id) {
            match node.listeners.as_mut() {
                Some(listeners) => {
                    if !listeners.contains(&listener) {
                        listeners.push(listener);
                    }
                }
                None => node.listeners = Some(vec![listener]),
            }
        }
    }

    /// Remove one listener. Absent paths and unknown listeners are silent
    /// no-ops. Emptying a leaf destroys it and prunes emptied ancestors.
    pub fn remove_listener<S: AsRef<str>>(
        &mut self,
        segments: &[S],
        listener: &L,
    ) {
        let id = match self.find(segments) {
            Some(id) => id,
            None => return,
        };
        let destroy = match self.node_mut(id) {
            Some(node) => {
                let listeners = match node.listeners.as_mut() {
                    Some(listeners) => listeners,
                    None => return,
                };
                let position = match listeners.iter().position(|existing| existing == listener) {
                    Some(position) => position,
                    None => return,
                };
                listeners.remove(position);
                if listeners.is_empty() {
                    node.listeners = None;
                    node.children.is_none()
                } else {
                    false
                }
            }
            None => return,
        };
        if destroy {
            self.destroy(id);
        }
    }

    /// Drop the node at `segments` together with every listener registered
    /// at or below it. Absent path is a no-op.
    pub fn remove_all_listeners<S: AsRef<str>>(
        &mut self,
        segments: &[S],
    ) {
        if let Some(id) = self.find(segments) {
            self.destroy(id);
        }
    }
}

impl<L: PartialEq + Clone> ListenerTree<L> {
    /// Copy of the direct listener set at `segments` (empty when absent)
    pub fn listeners<S: AsRef<str>>(
        &self,
        segments: &[S],
    ) -> Vec<L> {
        match self.find(segments).and_then(|id| self.node(id)) {
            Some(node) => node.listeners.clone().unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Listeners of every strict descendant of `segments`: depth-first,
    /// children in segment order, insertion order within a node
    pub fn descendant_listeners<S: AsRef<str>>(
        &self,
        segments: &[S],
    ) -> Vec<L> {
        let mut out = Vec::new();
        if let Some(id) = self.find(segments) {
            self.push_descendant_listeners(id, &mut out);
        }
        out
    }

    /// Every listener a mutation at `segments` must notify: the root, each
    /// ancestor in root-to-leaf order, the node itself, then all of its
    /// descendants. Sibling branches are never included. A missing ancestor
    /// ends the walk early — no node at `segments` can exist below it, so
    /// there are no descendants to visit either.
    pub fn affected_listeners<S: AsRef<str>>(
        &self,
        segments: &[S],
    ) -> Vec<L> {
        let mut out = Vec::new();
        let mut id = ROOT;
        self.push_listeners(id, &mut out);
        for segment in segments {
            let child = self
                .node(id)
                .and_then(|node| node.children.as_ref())
                .and_then(|children| children.get(segment.as_ref()))
                .copied();
            match child {
                Some(child) => {
                    id = child;
                    self.push_listeners(id, &mut out);
                }
                None => return out,
            }
        }
        self.push_descendant_listeners(id, &mut out);
        out
    }

    fn push_listeners(
        &self,
        id: NodeId,
        out: &mut Vec<L>,
    ) {
        if let Some(listeners) = self.node(id).and_then(|node| node.listeners.as_ref()) {
            out.extend(listeners.iter().cloned());
        }
    }

    fn push_descendant_listeners(
        &self,
        id: NodeId,
        out: &mut Vec<L>,
    ) {
        let children = match self.node(id).and_then(|node| node.children.as_ref()) {
            Some(children) => children,
            None => return,
        };
        for child in children.values() {
            self.push_listeners(*child, out);
            self.push_descendant_listeners(*child, out);
        }
    }
}
