//! Per-node visibility with edge cascade.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::NodeId;

/// Sparse visibility state: a node is visible unless its id is recorded here.
///
/// Keyed by node id (the wallet address when known), so the state survives
/// graph rebuilds. Edges store nothing; their visibility is derived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityMap {
    hidden: BTreeSet<NodeId>,
}

impl VisibilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip visibility for `id`. Returns the new visibility.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.hidden.remove(id) {
            true
        } else {
            self.hidden.insert(NodeId::from(id));
            false
        }
    }

    /// Force visibility for `id`.
    pub fn set_visible(&mut self, id: &str, visible: bool) {
        if visible {
            self.hidden.remove(id);
        } else {
            self.hidden.insert(NodeId::from(id));
        }
    }

    pub fn is_visible(&self, id: &str) -> bool {
        !self.hidden.contains(id)
    }

    /// An edge is visible only when both endpoints are.
    pub fn edge_visible(&self, source: &str, target: &str) -> bool {
        self.is_visible(source) && self.is_visible(target)
    }

    /// Ids currently hidden, in sorted order.
    pub fn hidden(&self) -> impl Iterator<Item = &NodeId> {
        self.hidden.iter()
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    /// Show everything again.
    pub fn reset(&mut self) {
        self.hidden.clear();
    }
}
