//! Barnes-Hut quadtree for O(n log n) force approximation.
//!
//! The quadtree recursively subdivides space and computes center of mass
//! for each cell. Distant cells can be approximated as single points,
//! reducing the O(n²) pairwise force calculation to O(n log n).

use crate::Position;

/// One cell of the quadtree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadCell {
    pub center_x: f64,
    pub center_y: f64,
    /// Number of bodies inside the cell.
    pub mass: f64,
    /// Side length of the (square) cell.
    pub width: f64,
    /// Children in NW, NE, SW, SE order.
    pub children: [Option<usize>; 4],
    /// Body indices held directly by a leaf. Empty for internal cells.
    pub bodies: Vec<usize>,
}

impl QuadCell {
    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

/// A Barnes-Hut quadtree for 2D spatial partitioning.
#[derive(Debug)]
pub struct QuadTree {
    /// Flattened cells; index 0 is the root.
    cells: Vec<QuadCell>,
    bounds_min: Position,
    bounds_max: Position,
}

impl QuadTree {
    /// Build a quadtree from body positions.
    ///
    /// # Arguments
    /// * `positions` - Slice of body positions
    /// * `max_depth` - Maximum tree depth; bodies still sharing a cell at
    ///   this depth are kept together in one leaf
    pub fn build(positions: &[Position], max_depth: usize) -> Self {
        if positions.is_empty() {
            return Self {
                cells: vec![QuadCell::default()],
                bounds_min: Position::default(),
                bounds_max: Position::default(),
            };
        }

        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;

        for pos in positions {
            min_x = min_x.min(pos.x);
            min_y = min_y.min(pos.y);
            max_x = max_x.max(pos.x);
            max_y = max_y.max(pos.y);
        }

        let padding = ((max_x - min_x).max(max_y - min_y) * 0.1).max(1.0);
        min_x -= padding;
        min_y -= padding;
        max_x += padding;
        max_y += padding;

        // Square
        let width = (max_x - min_x).max(max_y - min_y);
        let center_x = (min_x + max_x) / 2.0;
        let center_y = (min_y + max_y) / 2.0;

        let bounds_min = Position::new(center_x - width / 2.0, center_y - width / 2.0);
        let bounds_max = Position::new(center_x + width / 2.0, center_y + width / 2.0);

        let mut cells = Vec::with_capacity(positions.len() * 2);
        let mut builder = TreeBuilder {
            positions,
            cells: &mut cells,
            max_depth,
        };

        let indices: Vec<usize> = (0..positions.len()).collect();
        builder.build_cell(&indices, bounds_min.x, bounds_min.y, width, 0);

        Self {
            cells,
            bounds_min,
            bounds_max,
        }
    }

    pub fn cells(&self) -> &[QuadCell] {
        &self.cells
    }

    pub fn root(&self) -> &QuadCell {
        &self.cells[0]
    }

    pub fn cell(&self, index: usize) -> &QuadCell {
        &self.cells[index]
    }

    /// Get the bounding box.
    pub fn bounds(&self) -> (Position, Position) {
        (self.bounds_min, self.bounds_max)
    }
}

struct TreeBuilder<'a> {
    positions: &'a [Position],
    cells: &'a mut Vec<QuadCell>,
    max_depth: usize,
}

impl TreeBuilder<'_> {
    fn build_cell(
        &mut self,
        indices: &[usize],
        x: f64,
        y: f64,
        width: f64,
        depth: usize,
    ) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }

        let cell_idx = self.cells.len();
        self.cells.push(QuadCell::default());

        let mass = indices.len() as f64;
        let (sum_x, sum_y) = indices.iter().fold((0.0, 0.0), |(sx, sy), &i| {
            (sx + self.positions[i].x, sy + self.positions[i].y)
        });
        let center_x = sum_x / mass;
        let center_y = sum_y / mass;

        if indices.len() == 1 || depth >= self.max_depth {
            self.cells[cell_idx] = QuadCell {
                center_x,
                center_y,
                mass,
                width,
                children: [None; 4],
                bodies: indices.to_vec(),
            };
            return Some(cell_idx);
        }

        let half_width = width / 2.0;
        let mid_x = x + half_width;
        let mid_y = y + half_width;

        let mut nw_indices = Vec::new();
        let mut ne_indices = Vec::new();
        let mut sw_indices = Vec::new();
        let mut se_indices = Vec::new();

        for &i in indices {
            let pos = &self.positions[i];
            if pos.x < mid_x {
                if pos.y < mid_y {
                    sw_indices.push(i);
                } else {
                    nw_indices.push(i);
                }
            } else if pos.y < mid_y {
                se_indices.push(i);
            } else {
                ne_indices.push(i);
            }
        }

        let children = [
            self.build_cell(&nw_indices, x, mid_y, half_width, depth + 1),
            self.build_cell(&ne_indices, mid_x, mid_y, half_width, depth + 1),
            self.build_cell(&sw_indices, x, y, half_width, depth + 1),
            self.build_cell(&se_indices, mid_x, y, half_width, depth + 1),
        ];

        self.cells[cell_idx] = QuadCell {
            center_x,
            center_y,
            mass,
            width,
            children,
            bodies: Vec::new(),
        };

        Some(cell_idx)
    }
}
