//! Core domain types shared across the Bubblemap workspace.
//!
//! A query returns a nested wallet tree rooted at the main wallet. This crate
//! flattens that tree into a [`WalletGraph`], indexes the externally supplied
//! [`WalletAnalytics`], and tracks which nodes the user has hidden.

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

mod analytics;
mod builder;
mod numeric;
mod tree;
mod visibility;

pub use analytics::{
    AnalyticsIndex, Extremes, Flow, LatestTransfer, Transaction, TransactionMetadata,
    WalletAnalytics, WalletStats, SMART_CONTRACT_CATEGORY,
};
pub use builder::GraphBuilder;
pub use numeric::{coerce_f64, lenient_f64};
pub use tree::WalletTree;
pub use visibility::VisibilityMap;

// =============================================================================
// Graph Types
// =============================================================================

/// Identifier for nodes within a [`WalletGraph`].
///
/// Equal to the wallet address when one is known, otherwise a synthetic id
/// derived from the node's position in the tree.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A wallet (or contract) in the flattened graph.
///
/// Carries business data only; positions and velocities live in the layout
/// engine's arena, addressed by the node's index in [`WalletGraph::nodes`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletNode {
    /// Unique identifier within the graph.
    pub id: NodeId,
    /// Wallet address, if the tree supplied one.
    pub address: Option<String>,
    /// Native-currency balance, zero when the input was malformed.
    pub balance: f64,
    /// Branch-order tag, only used for the fallback color ramp.
    pub group: u32,
    /// True for the query root and nothing else.
    pub is_main_wallet: bool,
    /// Index of the parent node, `None` for the root.
    pub parent: Option<usize>,
    /// Distance from the root in tree edges.
    pub depth: u32,
}

impl WalletNode {
    /// Address if known, otherwise the node id.
    pub fn display_address(&self) -> &str {
        self.address.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Parent → child connection between two wallets.
///
/// Undirected for rendering purposes until the encoder derives an arrow
/// direction from transaction recency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletEdge {
    /// Index of the source node.
    pub source: usize,
    /// Index of the target node.
    pub target: usize,
    pub source_id: NodeId,
    pub target_id: NodeId,
}

/// Flattened wallet neighborhood.
#[derive(Debug, Default, Clone, Serialize)]
pub struct WalletGraph {
    nodes: Vec<WalletNode>,
    edges: Vec<WalletEdge>,
    #[serde(skip)]
    index: HashMap<NodeId, usize>,
}

impl WalletGraph {
    pub(crate) fn from_parts(
        nodes: Vec<WalletNode>,
        edges: Vec<WalletEdge>,
        index: HashMap<NodeId, usize>,
    ) -> Self {
        Self {
            nodes,
            edges,
            index,
        }
    }

    /// Creates an empty graph with no nodes or edges.
    pub fn empty() -> Self {
        Self::default()
    }

    /// All nodes in traversal order, root first.
    pub fn nodes(&self) -> &[WalletNode] {
        &self.nodes
    }

    /// All edges in traversal order.
    pub fn edges(&self) -> &[WalletEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index of the node with the given id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Node with the given id.
    pub fn node(&self, id: &str) -> Option<&WalletNode> {
        self.index_of(id).map(|idx| &self.nodes[idx])
    }

    /// Checks whether a node with the given id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// The query root.
    pub fn main_wallet(&self) -> Option<&WalletNode> {
        self.main_index().map(|idx| &self.nodes[idx])
    }

    pub fn main_index(&self) -> Option<usize> {
        self.nodes.iter().position(|node| node.is_main_wallet)
    }

    /// Direct children of the node at `index`, in traversal order.
    pub fn children_of(&self, index: usize) -> impl Iterator<Item = &WalletNode> + '_ {
        self.nodes
            .iter()
            .filter(move |node| node.parent == Some(index))
    }

    /// Convert to a petgraph `DiGraph` for analysis.
    /// Node weights are the node ids; graph indices match [`Self::nodes`].
    pub fn to_petgraph(&self) -> DiGraph<NodeId, ()> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        for node in &self.nodes {
            graph.add_node(node.id.clone());
        }
        for edge in &self.edges {
            graph.add_edge(NodeIndex::new(edge.source), NodeIndex::new(edge.target), ());
        }
        graph
    }

    /// True when the graph is a single connected tree (N nodes, N−1 edges).
    ///
    /// Repeated addresses in the input tree fold into one node, which can
    /// add extra edges and break this property.
    pub fn is_tree(&self) -> bool {
        if self.nodes.is_empty() || self.edges.len() != self.nodes.len() - 1 {
            return false;
        }
        petgraph::algo::connected_components(&self.to_petgraph()) == 1
    }
}
