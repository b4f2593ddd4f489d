//! Error types for layout operations.

use thiserror::Error;

/// Errors that can occur during layout operations.
#[derive(Error, Debug, PartialEq)]
pub enum LayoutError {
    /// Invalid graph data.
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// An edge references a node that does not exist.
    #[error("Edge {edge} references node {node}, but only {node_count} nodes exist")]
    InvalidEdge {
        edge: usize,
        node: usize,
        node_count: usize,
    },

    /// A node index passed to a drag operation is out of range.
    #[error("Node {0} is out of range")]
    NodeOutOfRange(usize),

    /// Layout not initialized.
    #[error("Layout not initialized")]
    NotInitialized,
}
