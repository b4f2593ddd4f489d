//! The bubble map session: one owner for graph, layout and overlay state.
//!
//! The host drives it with [`BubbleMapSession::tick`] once per animation
//! frame, feeds pointer input through [`BubbleMapSession::handle_pointer`],
//! and paints whatever [`BubbleMapSession::frame`] returns.

use bubblemap_core::{
    AnalyticsIndex, Extremes, GraphBuilder, NodeId, VisibilityMap, WalletAnalytics, WalletGraph,
    WalletTree,
};
use bubblemap_layout::{phyllotaxis, Edge, ForceLayout, LayoutConfig, LayoutError, Position};
use chrono::{DateTime, Utc};
use egui::{pos2, Color32, Pos2};
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::interaction::{CursorHint, Intent, InteractionLayer, PointerEvent, Viewport};
use crate::render::{
    group_color, hex, resolve_edge_visuals, resolve_node_visuals, ArrowDirection,
    EdgeRenderContext, NodeRenderContext, NodeVisuals,
};
use crate::selection::{DetailError, DetailState, DetailTicket, SelectionController, WalletDetail};
use crate::settings::VizSettings;
use crate::wallets::{wallet_list, NodeSummary, WalletListEntry};

/// Glyph drawn on top of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeMarker {
    /// The query root.
    Target,
    /// The visible selected node.
    Check,
}

/// A circle to paint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePrimitive {
    pub id: NodeId,
    pub address: Option<String>,
    pub x: f64,
    pub y: f64,
    pub radius: f32,
    #[serde(serialize_with = "serialize_color")]
    pub fill: Color32,
    /// Branch tag and its rainbow color, for hosts that color by branch.
    pub group: u32,
    #[serde(serialize_with = "serialize_color")]
    pub group_fill: Color32,
    pub opacity: f32,
    #[serde(serialize_with = "serialize_color")]
    pub stroke_color: Color32,
    pub stroke_width: f32,
    pub visible: bool,
    pub selected: bool,
    pub is_main_wallet: bool,
    /// Glyphs drawn on top, in paint order.
    pub markers: Vec<NodeMarker>,
}

/// A line to paint, from source to target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgePrimitive {
    pub source: NodeId,
    pub target: NodeId,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub width: f32,
    #[serde(serialize_with = "serialize_color")]
    pub color: Color32,
    pub opacity: f32,
    pub arrow: ArrowDirection,
    pub dash: [f32; 2],
    pub visible: bool,
}

/// Everything the drawing surface needs for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct RenderFrame {
    pub nodes: Vec<NodePrimitive>,
    pub edges: Vec<EdgePrimitive>,
    pub viewport: Viewport,
    pub cursor: CursorHint,
    pub alpha: f64,
    pub settled: bool,
    pub selected: Option<NodeId>,
    pub detail: DetailState,
}

impl RenderFrame {
    pub fn node(&self, id: &str) -> Option<&NodePrimitive> {
        self.nodes.iter().find(|node| node.id.as_str() == id)
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&EdgePrimitive> {
        self.edges
            .iter()
            .find(|edge| edge.source.as_str() == source && edge.target.as_str() == target)
    }
}

fn serialize_color<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex(*color))
}

fn to_pos2(position: Position) -> Pos2 {
    pos2(position.x as f32, position.y as f32)
}

/// Interactive state for one bubble map.
#[derive(Debug)]
pub struct BubbleMapSession {
    graph: WalletGraph,
    layout: ForceLayout,
    settings: VizSettings,
    analytics: AnalyticsIndex,
    extremes: Extremes,
    visibility: VisibilityMap,
    selection: SelectionController,
    interaction: InteractionLayer,
    shut_down: bool,
}

impl Default for BubbleMapSession {
    fn default() -> Self {
        Self::new(LayoutConfig::default(), VizSettings::default())
    }
}

impl BubbleMapSession {
    pub fn new(layout_config: LayoutConfig, settings: VizSettings) -> Self {
        Self {
            graph: WalletGraph::empty(),
            layout: ForceLayout::new(layout_config),
            settings,
            analytics: AnalyticsIndex::default(),
            extremes: Extremes::default(),
            visibility: VisibilityMap::new(),
            selection: SelectionController::new(),
            interaction: InteractionLayer::new(),
            shut_down: false,
        }
    }

    /// Replace the wallet tree.
    ///
    /// Rebuilds the graph and restarts the layout. Visibility carries over by
    /// node id. The selection is kept when its node survives, otherwise the
    /// main wallet is selected. Returns the detail request to issue, if any.
    pub fn set_input_tree(
        &mut self,
        tree: &WalletTree,
    ) -> Result<Option<DetailTicket>, LayoutError> {
        self.selection.cancel();
        self.interaction.reset_gesture();

        let graph = GraphBuilder::flatten(tree);
        let config = self.layout.config();
        let positions = phyllotaxis(graph.node_count(), config.center(), config.initial_radius);
        let edges = graph
            .edges()
            .iter()
            .map(|edge| Edge::new(edge.source, edge.target))
            .collect();
        self.layout.init(positions, edges)?;

        self.extremes = Extremes::compute(&graph, &self.analytics);
        self.graph = graph;
        self.shut_down = false;
        info!(
            "Loaded wallet tree: {} nodes, {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );

        let kept = self
            .selection
            .selected()
            .filter(|id| self.graph.contains(id.as_str()))
            .cloned();
        let resolved = matches!(
            self.selection.detail(),
            DetailState::Loaded { .. } | DetailState::Failed { .. }
        );
        let ticket = match kept {
            Some(_) if resolved => None,
            Some(id) => self.select(id.as_str()),
            None => {
                let main = self.graph.main_wallet().map(|node| node.id.clone());
                match main {
                    Some(id) => self.select(id.as_str()),
                    None => {
                        self.selection.clear();
                        None
                    }
                }
            }
        };
        Ok(ticket)
    }

    /// Replace the analytics used for encoding.
    pub fn set_analytics(&mut self, entries: &[WalletAnalytics]) {
        self.analytics = AnalyticsIndex::new(entries);
        self.extremes = Extremes::compute(&self.graph, &self.analytics);
        debug!(entries = self.analytics.len(), "Analytics updated");
    }

    /// Select the node `id`. Returns the detail request to issue.
    ///
    /// Nodes without an address are selected but fail detail loading
    /// immediately, so no request is needed.
    pub fn select(&mut self, id: &str) -> Option<DetailTicket> {
        let node = self.graph.node(id)?;
        let node_id = node.id.clone();
        let address = node.address.clone();

        let ticket = self
            .selection
            .select(node_id, address.as_deref().unwrap_or_default());
        debug!(id, generation = ticket.generation, "Node selected");
        match address {
            Some(_) => Some(ticket),
            None => {
                self.selection
                    .resolve(&ticket, Err(DetailError::InvalidAddress));
                None
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Apply a finished detail request. Stale tickets are ignored.
    pub fn resolve_detail(
        &mut self,
        ticket: &DetailTicket,
        result: Result<WalletDetail, DetailError>,
    ) -> bool {
        self.selection.resolve(ticket, result)
    }

    /// Flip visibility of `id`. Returns the new visibility, or `None` for
    /// an unknown id.
    pub fn toggle_visibility(&mut self, id: &str) -> Option<bool> {
        if !self.graph.contains(id) {
            return None;
        }
        let visible = self.visibility.toggle(id);
        debug!(id, visible, "Visibility toggled");
        Some(visible)
    }

    /// Feed one pointer event. Returns the detail request to issue when the
    /// event completed a click on a node.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<DetailTicket> {
        if self.shut_down {
            return None;
        }

        let scene = Scene {
            graph: &self.graph,
            layout: &self.layout,
            visibility: &self.visibility,
            selection: &self.selection,
            analytics: &self.analytics,
            extremes: &self.extremes,
            settings: &self.settings,
        };
        let intents = self.interaction.handle(event, |world| scene.hit_test(world));

        let mut ticket = None;
        for intent in intents {
            let outcome = match intent {
                Intent::DragStart { node, at } => self
                    .layout
                    .drag_start(node, Position::new(at.x as f64, at.y as f64)),
                Intent::DragMove { node, at } => self
                    .layout
                    .drag_move(node, Position::new(at.x as f64, at.y as f64)),
                Intent::DragEnd { node } => self.layout.drag_end(node),
                Intent::Select { node } => {
                    if let Some(id) = self.graph.nodes().get(node).map(|n| n.id.clone()) {
                        ticket = self.select(id.as_str());
                    }
                    Ok(())
                }
            };
            if let Err(err) = outcome {
                warn!("Ignoring pointer intent {:?}: {}", intent, err);
            }
        }
        ticket
    }

    /// Topmost visible node containing `world`.
    pub fn hit_test(&self, world: Pos2) -> Option<usize> {
        self.scene().hit_test(world)
    }

    /// Advance the layout one tick. Returns whether anything moved.
    pub fn tick(&mut self) -> bool {
        if self.shut_down {
            return false;
        }
        match self.layout.step() {
            Ok(moved) => moved,
            Err(LayoutError::NotInitialized) => false,
            Err(err) => {
                warn!("Layout step failed: {}", err);
                false
            }
        }
    }

    /// Tick until settled or `max_ticks`. Returns ticks run.
    pub fn run_until_settled(&mut self, max_ticks: u32) -> u32 {
        let mut ticks = 0;
        while ticks < max_ticks && self.tick() {
            ticks += 1;
        }
        ticks
    }

    pub fn is_settled(&self) -> bool {
        self.layout.is_converged()
    }

    /// Stop ticking and drop any in-flight detail request.
    pub fn shutdown(&mut self) {
        self.layout.pause();
        self.selection.cancel();
        self.interaction.reset_gesture();
        self.shut_down = true;
        debug!("Session shut down");
    }

    fn scene(&self) -> Scene<'_> {
        Scene {
            graph: &self.graph,
            layout: &self.layout,
            visibility: &self.visibility,
            selection: &self.selection,
            analytics: &self.analytics,
            extremes: &self.extremes,
            settings: &self.settings,
        }
    }

    /// Snapshot for the drawing surface.
    pub fn frame(&self, now: DateTime<Utc>) -> RenderFrame {
        let scene = self.scene();
        let position = |idx: usize| self.layout.position(idx).unwrap_or_default();

        let nodes = self
            .graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(idx, node)| {
                let visuals = scene.node_visuals(idx);
                let p = position(idx);
                let visible = self.visibility.is_visible(node.id.as_str());
                let selected = self.selection.is_selected(node.id.as_str());
                let mut markers = Vec::new();
                if node.is_main_wallet {
                    markers.push(NodeMarker::Target);
                }
                if selected && visible {
                    markers.push(NodeMarker::Check);
                }
                NodePrimitive {
                    id: node.id.clone(),
                    address: node.address.clone(),
                    x: p.x,
                    y: p.y,
                    radius: visuals.radius,
                    fill: visuals.fill,
                    group: node.group,
                    group_fill: group_color(node.group),
                    opacity: visuals.opacity,
                    stroke_color: visuals.stroke.color,
                    stroke_width: visuals.stroke.width,
                    visible,
                    selected,
                    is_main_wallet: node.is_main_wallet,
                    markers,
                }
            })
            .collect();

        let edges = self
            .graph
            .edges()
            .iter()
            .map(|edge| {
                let target = &self.graph.nodes()[edge.target];
                let target_stats = target
                    .address
                    .as_deref()
                    .and_then(|address| self.analytics.get(address));
                let visuals = resolve_edge_visuals(EdgeRenderContext {
                    target_stats,
                    extremes: &self.extremes,
                    settings: &self.settings,
                    now,
                });
                let (from, to) = (position(edge.source), position(edge.target));
                EdgePrimitive {
                    source: edge.source_id.clone(),
                    target: edge.target_id.clone(),
                    x1: from.x,
                    y1: from.y,
                    x2: to.x,
                    y2: to.y,
                    width: visuals.stroke.width,
                    color: visuals.stroke.color,
                    opacity: visuals.opacity,
                    arrow: visuals.arrow,
                    dash: self.settings.palette.edge_dash,
                    visible: self
                        .visibility
                        .edge_visible(edge.source_id.as_str(), edge.target_id.as_str()),
                }
            })
            .collect();

        RenderFrame {
            nodes,
            edges,
            viewport: *self.interaction.viewport(),
            cursor: self.interaction.cursor(),
            alpha: self.layout.alpha(),
            settled: self.layout.is_converged(),
            selected: self.selection.selected().cloned(),
            detail: self.selection.detail().clone(),
        }
    }

    pub fn wallet_list(&self, search: &str) -> Vec<WalletListEntry> {
        wallet_list(
            &self.graph,
            &self.visibility,
            self.selection.selected(),
            search,
        )
    }

    pub fn node_summary(&self, id: &str) -> Option<NodeSummary> {
        self.graph.node(id).map(NodeSummary::of)
    }

    pub fn graph(&self) -> &WalletGraph {
        &self.graph
    }

    pub fn layout(&self) -> &ForceLayout {
        &self.layout
    }

    pub fn analytics(&self) -> &AnalyticsIndex {
        &self.analytics
    }

    pub fn extremes(&self) -> &Extremes {
        &self.extremes
    }

    pub fn visibility(&self) -> &VisibilityMap {
        &self.visibility
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn viewport(&self) -> &Viewport {
        self.interaction.viewport()
    }

    pub fn settings(&self) -> &VizSettings {
        &self.settings
    }
}

/// Borrowed view used for encoding and hit-testing.
struct Scene<'a> {
    graph: &'a WalletGraph,
    layout: &'a ForceLayout,
    visibility: &'a VisibilityMap,
    selection: &'a SelectionController,
    analytics: &'a AnalyticsIndex,
    extremes: &'a Extremes,
    settings: &'a VizSettings,
}

impl Scene<'_> {
    fn node_visuals(&self, idx: usize) -> NodeVisuals {
        let node = &self.graph.nodes()[idx];
        let stats = node
            .address
            .as_deref()
            .and_then(|address| self.analytics.get(address));
        resolve_node_visuals(NodeRenderContext {
            balance: node.balance,
            is_main_wallet: node.is_main_wallet,
            selected: self.selection.is_selected(node.id.as_str()),
            stats,
            extremes: self.extremes,
            settings: self.settings,
        })
    }

    /// Hidden nodes are never hit; later nodes are drawn on top.
    fn hit_test(&self, world: Pos2) -> Option<usize> {
        self.graph
            .nodes()
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, node)| self.visibility.is_visible(node.id.as_str()))
            .find_map(|(idx, _)| {
                let center = to_pos2(self.layout.position(idx)?);
                let radius = self.node_visuals(idx).radius;
                (center.distance(world) <= radius).then_some(idx)
            })
    }
}
