//! Force-directed graph layout for the wallet bubble map.
//!
//! A classic relaxation in the style of d3-force, run on the CPU:
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Link force  │──▶│  Many-body   │──▶│  Centering   │──▶│  Integrate   │
//! │ (edge pulls) │   │ (Barnes-Hut) │   │ (mean + X/Y) │   │ (decay, pin) │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! Each [`ForceLayout::tick`] cools the simulation's `alpha`; once it falls
//! below `alpha_min` the layout is converged and ticks stop moving nodes.
//! Dragging reheats the simulation and pins the dragged node to the pointer.
//!
//! The engine owns an arena of [`Body`] values indexed like the graph's
//! node list. It knows nothing about wallets.

mod error;
mod layout;
mod quadtree;

pub use error::LayoutError;
pub use layout::{phyllotaxis, ForceLayout, LayoutConfig, LayoutState};
pub use quadtree::{QuadCell, QuadTree};

use serde::{Deserialize, Serialize};

/// Result type for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// A 2D position in canvas units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A 2D velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
}

/// An edge between two nodes, by index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
}

impl Edge {
    pub fn new(source: usize, target: usize) -> Self {
        Self { source, target }
    }
}

/// Simulation state for one node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Body {
    pub position: Position,
    pub velocity: Velocity,
    /// Fixed position while the node is being dragged.
    pub pin: Option<Position>,
}

impl Body {
    pub fn at(position: Position) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.pin.is_some()
    }
}
