//! Force simulation driving node positions.

use serde::{Deserialize, Serialize};

use crate::quadtree::QuadTree;
use crate::{Body, Edge, LayoutError, Position, Result};

/// Configuration for the force layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Canvas width; the layout is centered at `width / 2`.
    pub width: f64,
    /// Canvas height; the layout is centered at `height / 2`.
    pub height: f64,
    /// Rest length of every link.
    pub link_distance: f64,
    /// Many-body strength. Negative repels.
    pub charge_strength: f64,
    /// Barnes-Hut theta (0.5-1.0). Zero disables approximation.
    pub theta: f64,
    /// Pairs closer than this are treated as being this far apart.
    pub distance_min: f64,
    /// Per-axis pull toward the canvas center.
    pub axis_strength: f64,
    pub alpha_decay: f64,
    /// Below this the layout is converged.
    pub alpha_min: f64,
    /// Alpha target held while at least one node is dragged.
    pub drag_alpha_target: f64,
    /// Fraction of velocity lost per tick.
    pub velocity_decay: f64,
    /// Use Barnes-Hut (true) or simple O(n²) (false).
    pub use_barnes_hut: bool,
    /// Maximum quadtree depth.
    pub max_tree_depth: usize,
    /// Spacing of the initial phyllotaxis spiral.
    pub initial_radius: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            link_distance: 120.0,
            charge_strength: -500.0,
            theta: 0.9,
            distance_min: 1.0,
            axis_strength: 0.1,
            alpha_decay: 0.05,
            alpha_min: 0.001,
            drag_alpha_target: 0.3,
            velocity_decay: 0.4,
            use_barnes_hut: true,
            max_tree_depth: 12,
            initial_radius: 10.0,
        }
    }
}

impl LayoutConfig {
    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Current state of the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutState {
    /// Layout is not initialized.
    Uninitialized,
    /// Layout is running.
    Running,
    /// Layout is paused.
    Paused,
    /// Layout has converged.
    Converged,
}

/// Initial placement on a sunflower spiral around `center`.
pub fn phyllotaxis(count: usize, center: Position, radius: f64) -> Vec<Position> {
    let angle = std::f64::consts::PI * (3.0 - 5f64.sqrt());
    (0..count)
        .map(|i| {
            let r = radius * (0.5 + i as f64).sqrt();
            let a = i as f64 * angle;
            Position::new(center.x + r * a.cos(), center.y + r * a.sin())
        })
        .collect()
}

/// Deterministic linear congruential source for jiggle.
#[derive(Debug, Clone)]
struct Lcg(u32);

impl Lcg {
    fn new() -> Self {
        Self(1)
    }

    fn next(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0 as f64 / 4_294_967_296.0
    }

    /// A tiny nonzero-ish offset to separate coincident bodies.
    fn jiggle(&mut self) -> f64 {
        (self.next() - 0.5) * 1e-6
    }
}

/// CPU force-directed graph layout.
#[derive(Debug)]
pub struct ForceLayout {
    config: LayoutConfig,
    state: LayoutState,
    bodies: Vec<Body>,
    edges: Vec<Edge>,
    link_strength: Vec<f64>,
    link_bias: Vec<f64>,
    alpha: f64,
    alpha_target: f64,
    active_drags: usize,
    iteration: u32,
    random: Lcg,
}

impl ForceLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            state: LayoutState::Uninitialized,
            bodies: Vec::new(),
            edges: Vec::new(),
            link_strength: Vec::new(),
            link_bias: Vec::new(),
            alpha: 1.0,
            alpha_target: 0.0,
            active_drags: 0,
            iteration: 0,
            random: Lcg::new(),
        }
    }

    /// Initialize the layout with graph data and start it hot.
    pub fn init(&mut self, positions: Vec<Position>, edges: Vec<Edge>) -> Result<()> {
        if positions.is_empty() {
            return Err(LayoutError::InvalidGraph("No nodes".into()));
        }

        let node_count = positions.len();
        for (edge_idx, edge) in edges.iter().enumerate() {
            for node in [edge.source, edge.target] {
                if node >= node_count {
                    return Err(LayoutError::InvalidEdge {
                        edge: edge_idx,
                        node,
                        node_count,
                    });
                }
            }
        }

        let mut degree = vec![0usize; node_count];
        for edge in &edges {
            degree[edge.source] += 1;
            degree[edge.target] += 1;
        }
        self.link_strength = edges
            .iter()
            .map(|e| 1.0 / degree[e.source].min(degree[e.target]) as f64)
            .collect();
        self.link_bias = edges
            .iter()
            .map(|e| {
                let (s, t) = (degree[e.source] as f64, degree[e.target] as f64);
                s / (s + t)
            })
            .collect();

        self.bodies = positions.into_iter().map(Body::at).collect();
        self.edges = edges;
        self.alpha = 1.0;
        self.alpha_target = 0.0;
        self.active_drags = 0;
        self.iteration = 0;
        self.random = Lcg::new();
        self.state = LayoutState::Running;

        tracing::info!(
            "Force layout initialized: {} nodes, {} edges",
            self.bodies.len(),
            self.edges.len()
        );

        Ok(())
    }

    /// Resume ticking without changing alpha.
    pub fn restart(&mut self) {
        if self.state != LayoutState::Uninitialized {
            self.state = LayoutState::Running;
        }
    }

    /// Reset alpha to 1 and resume.
    pub fn reheat(&mut self) {
        self.alpha = 1.0;
        self.restart();
    }

    /// Pause the layout.
    pub fn pause(&mut self) {
        if self.state == LayoutState::Running {
            self.state = LayoutState::Paused;
        }
    }

    pub fn state(&self) -> LayoutState {
        self.state
    }

    pub fn is_converged(&self) -> bool {
        self.state == LayoutState::Converged
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn position(&self, index: usize) -> Option<Position> {
        self.bodies.get(index).map(|b| b.position)
    }

    pub fn positions(&self) -> Vec<Position> {
        self.bodies.iter().map(|b| b.position).collect()
    }

    /// Advance one tick. Returns whether positions were updated.
    pub fn step(&mut self) -> Result<bool> {
        match self.state {
            LayoutState::Uninitialized => return Err(LayoutError::NotInitialized),
            LayoutState::Running => {}
            LayoutState::Paused | LayoutState::Converged => return Ok(false),
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        let alpha = self.alpha;

        self.apply_links(alpha);
        self.apply_many_body(alpha);
        self.apply_centering(alpha);
        self.integrate();
        self.iteration += 1;

        if self.alpha < self.config.alpha_min {
            self.state = LayoutState::Converged;
            tracing::debug!("Layout converged after {} iterations", self.iteration);
        }

        Ok(true)
    }

    /// Tick until converged or `max_ticks` is reached. Returns ticks run.
    pub fn run(&mut self, max_ticks: u32) -> Result<u32> {
        let mut ticks = 0;
        while ticks < max_ticks && self.step()? {
            ticks += 1;
        }
        Ok(ticks)
    }

    /// Pin `index` at `at`. The first concurrent drag reheats the layout.
    pub fn drag_start(&mut self, index: usize, at: Position) -> Result<()> {
        let body = self
            .bodies
            .get_mut(index)
            .ok_or(LayoutError::NodeOutOfRange(index))?;
        body.pin = Some(at);
        body.position = at;

        if self.active_drags == 0 {
            self.alpha_target = self.config.drag_alpha_target;
            self.restart();
        }
        self.active_drags += 1;
        Ok(())
    }

    pub fn drag_move(&mut self, index: usize, at: Position) -> Result<()> {
        let body = self
            .bodies
            .get_mut(index)
            .ok_or(LayoutError::NodeOutOfRange(index))?;
        body.pin = Some(at);
        Ok(())
    }

    /// Release the pin on `index`. The last concurrent drag lets the layout cool.
    pub fn drag_end(&mut self, index: usize) -> Result<()> {
        let body = self
            .bodies
            .get_mut(index)
            .ok_or(LayoutError::NodeOutOfRange(index))?;
        body.pin = None;

        self.active_drags = self.active_drags.saturating_sub(1);
        if self.active_drags == 0 {
            self.alpha_target = 0.0;
        }
        Ok(())
    }

    pub fn active_drags(&self) -> usize {
        self.active_drags
    }

    fn apply_links(&mut self, alpha: f64) {
        let distance = self.config.link_distance;
        for (i, edge) in self.edges.iter().enumerate() {
            let source = self.bodies[edge.source];
            let target = self.bodies[edge.target];

            let mut x = target.position.x + target.velocity.x
                - source.position.x
                - source.velocity.x;
            let mut y = target.position.y + target.velocity.y
                - source.position.y
                - source.velocity.y;
            if x == 0.0 {
                x = self.random.jiggle();
            }
            if y == 0.0 {
                y = self.random.jiggle();
            }

            let len = (x * x + y * y).sqrt();
            if len == 0.0 {
                continue;
            }
            let k = (len - distance) / len * alpha * self.link_strength[i];
            x *= k;
            y *= k;

            let bias = self.link_bias[i];
            let t = &mut self.bodies[edge.target].velocity;
            t.x -= x * bias;
            t.y -= y * bias;
            let s = &mut self.bodies[edge.source].velocity;
            s.x += x * (1.0 - bias);
            s.y += y * (1.0 - bias);
        }
    }

    fn apply_many_body(&mut self, alpha: f64) {
        if self.bodies.len() < 2 {
            return;
        }

        let positions = self.positions();
        let field = ManyBody {
            positions: &positions,
            strength: self.config.charge_strength,
            theta2: self.config.theta * self.config.theta,
            distance_min2: self.config.distance_min * self.config.distance_min,
            alpha,
        };

        if self.config.use_barnes_hut {
            let tree = QuadTree::build(&positions, self.config.max_tree_depth);
            for i in 0..self.bodies.len() {
                let (fx, fy) = field.approximate(&tree, i, &mut self.random);
                self.bodies[i].velocity.x += fx;
                self.bodies[i].velocity.y += fy;
            }
        } else {
            for i in 0..self.bodies.len() {
                let (fx, fy) = field.exact(i, &mut self.random);
                self.bodies[i].velocity.x += fx;
                self.bodies[i].velocity.y += fy;
            }
        }
    }

    /// Mean recentering followed by a weak per-axis pull.
    fn apply_centering(&mut self, alpha: f64) {
        let center = self.config.center();
        let n = self.bodies.len() as f64;
        let (sum_x, sum_y) = self
            .bodies
            .iter()
            .fold((0.0, 0.0), |(sx, sy), b| (sx + b.position.x, sy + b.position.y));
        let shift_x = sum_x / n - center.x;
        let shift_y = sum_y / n - center.y;

        let k = self.config.axis_strength * alpha;
        for body in &mut self.bodies {
            body.position.x -= shift_x;
            body.position.y -= shift_y;
            body.velocity.x += (center.x - body.position.x) * k;
            body.velocity.y += (center.y - body.position.y) * k;
        }
    }

    fn integrate(&mut self) {
        let keep = 1.0 - self.config.velocity_decay;
        for body in &mut self.bodies {
            match body.pin {
                Some(pin) => {
                    body.position = pin;
                    body.velocity = Default::default();
                }
                None => {
                    body.velocity.x *= keep;
                    body.velocity.y *= keep;
                    body.position.x += body.velocity.x;
                    body.position.y += body.velocity.y;
                }
            }
        }
    }
}

/// Pairwise charge between bodies, exact or via a quadtree.
struct ManyBody<'a> {
    positions: &'a [Position],
    strength: f64,
    theta2: f64,
    distance_min2: f64,
    alpha: f64,
}

impl ManyBody<'_> {
    fn pair(&self, i: usize, j: usize, random: &mut Lcg) -> (f64, f64) {
        let (p, q) = (self.positions[i], self.positions[j]);
        let mut dx = q.x - p.x;
        let mut dy = q.y - p.y;
        if dx == 0.0 {
            dx = random.jiggle();
        }
        if dy == 0.0 {
            dy = random.jiggle();
        }
        let mut l = dx * dx + dy * dy;
        if l == 0.0 {
            return (0.0, 0.0);
        }
        if l < self.distance_min2 {
            l = (self.distance_min2 * l).sqrt();
        }
        let w = self.strength * self.alpha / l;
        (dx * w, dy * w)
    }

    fn exact(&self, i: usize, random: &mut Lcg) -> (f64, f64) {
        (0..self.positions.len())
            .filter(|&j| j != i)
            .map(|j| self.pair(i, j, random))
            .fold((0.0, 0.0), |(ax, ay), (fx, fy)| (ax + fx, ay + fy))
    }

    fn approximate(&self, tree: &QuadTree, i: usize, random: &mut Lcg) -> (f64, f64) {
        let p = self.positions[i];
        let (mut vx, mut vy) = (0.0, 0.0);
        let mut stack = vec![0usize];

        while let Some(idx) = stack.pop() {
            let cell = tree.cell(idx);
            if cell.mass == 0.0 {
                continue;
            }

            let dx = cell.center_x - p.x;
            let dy = cell.center_y - p.y;
            let mut l = dx * dx + dy * dy;

            // Far enough: treat the whole cell as one body.
            if cell.width * cell.width / self.theta2 < l {
                if l < self.distance_min2 {
                    l = (self.distance_min2 * l).sqrt();
                }
                let w = self.strength * cell.mass * self.alpha / l;
                vx += dx * w;
                vy += dy * w;
                continue;
            }

            if cell.is_leaf() {
                for &j in &cell.bodies {
                    if j != i {
                        let (fx, fy) = self.pair(i, j, random);
                        vx += fx;
                        vy += fy;
                    }
                }
            } else {
                stack.extend(cell.children.iter().flatten());
            }
        }

        (vx, vy)
    }
}
