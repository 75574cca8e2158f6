use filament_dom::{ListenerId, NodeId};
use indexmap::IndexMap;

/// Node -> event type -> listener handles. Kept so every listener the
/// observer attached can be detached again.
#[derive(Debug, Default)]
pub struct NodeEventMap {
    entries: IndexMap<NodeId, IndexMap<String, Vec<ListenerId>>>,
}

impl NodeEventMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, node: NodeId, kind: &str, listener: ListenerId) {
        self.entries
            .entry(node)
            .or_default()
            .entry(kind.to_string())
            .or_default()
            .push(listener);
    }

    /// Total number of recorded listeners
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .flat_map(|kinds| kinds.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Event types with listeners on `node`, in registration order
    pub fn kinds(&self, node: NodeId) -> Vec<String> {
        self.entries
            .get(&node)
            .map_or_else(Vec::new, |kinds| kinds.keys().cloned().collect())
    }

    /// Forget and return the listeners of `node`
    pub fn take_node(&mut self, node: NodeId) -> Vec<ListenerId> {
        self.entries
            .shift_remove(&node)
            .map_or_else(Vec::new, |kinds| kinds.into_values().flatten().collect())
    }

    /// Forget and return every listener
    pub fn drain(&mut self) -> Vec<(NodeId, ListenerId)> {
        self.entries
            .drain(..)
            .flat_map(|(node, kinds)| {
                kinds
                    .into_values()
                    .flatten()
                    .map(move |listener| (node, listener))
            })
            .collect()
    }
}
