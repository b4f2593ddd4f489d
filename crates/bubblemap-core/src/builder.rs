//! Flattens a nested [`WalletTree`] into a [`WalletGraph`].

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::{NodeId, WalletEdge, WalletGraph, WalletNode, WalletTree};

/// Id given to a root wallet that arrived without an address.
const SYNTHETIC_ROOT_ID: &str = "root";

/// Builder for constructing a [`WalletGraph`] from a wallet tree.
///
/// Nodes are emitted in depth-first pre-order, root first. Nodes without an
/// address get a path-derived id (`"{parent}#{child_index}"`), so rebuilding
/// the same tree always yields the same ids.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<WalletNode>,
    edges: Vec<WalletEdge>,
    index: HashMap<NodeId, usize>,
    edge_set: HashSet<(usize, usize)>,
    duplicates: usize,
}

impl GraphBuilder {
    /// Flatten `tree` into nodes and parent → child edges.
    pub fn flatten(tree: &WalletTree) -> WalletGraph {
        let mut builder = Self::default();
        builder.visit(tree, None, 0, 1, 0);

        if builder.duplicates > 0 {
            warn!(
                duplicates = builder.duplicates,
                "wallet tree repeats addresses; repeated wallets were merged"
            );
        }
        debug!(
            nodes = builder.nodes.len(),
            edges = builder.edges.len(),
            "wallet_graph_built"
        );

        WalletGraph::from_parts(builder.nodes, builder.edges, builder.index)
    }

    fn visit(
        &mut self,
        tree: &WalletTree,
        parent: Option<usize>,
        child_index: usize,
        group: u32,
        depth: u32,
    ) {
        let id = match (tree.address(), parent) {
            (Some(address), _) => NodeId::from(address),
            (None, Some(parent)) => {
                NodeId(format!("{}#{}", self.nodes[parent].id, child_index))
            }
            (None, None) => NodeId::from(SYNTHETIC_ROOT_ID),
        };

        let index = match self.index.get(&id) {
            Some(&existing) => {
                self.duplicates += 1;
                existing
            }
            None => {
                let index = self.nodes.len();
                self.nodes.push(WalletNode {
                    id: id.clone(),
                    address: tree.address().map(str::to_string),
                    balance: tree.balance,
                    group,
                    is_main_wallet: parent.is_none(),
                    parent,
                    depth,
                });
                self.index.insert(id, index);
                index
            }
        };

        if let Some(parent) = parent {
            self.add_edge(parent, index);
        }

        for (child_index, child) in tree.children.iter().enumerate() {
            let child_group = group + child_index as u32 + 1;
            self.visit(child, Some(index), child_index, child_group, depth + 1);
        }
    }

    fn add_edge(&mut self, source: usize, target: usize) {
        if source == target || !self.edge_set.insert((source, target)) {
            return;
        }
        self.edges.push(WalletEdge {
            source,
            target,
            source_id: self.nodes[source].id.clone(),
            target_id: self.nodes[target].id.clone(),
        });
    }
}
