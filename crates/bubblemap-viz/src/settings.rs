//! Settings structures for the visual encoding.

use egui::Color32;
use serde::{Deserialize, Serialize};

/// Fixed colors used by the encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Main wallet fill.
    pub accent: Color32,
    /// Smart contract fill.
    pub contract: Color32,
    /// Fill when there is no profitability signal.
    pub neutral: Color32,
    pub stroke: Color32,
    /// Stroke of the selected node.
    pub highlight: Color32,
    /// Edge toward a wallet with net inflow.
    pub growth: Color32,
    /// Edge toward a wallet with net outflow.
    pub drain: Color32,
    /// Edge toward a wallet whose flows cancel out.
    pub warning: Color32,
    /// Edge toward a wallet without analytics.
    pub edge_default: Color32,
    /// Dash and gap lengths for edges.
    pub edge_dash: [f32; 2],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            accent: Color32::from_rgb(0xFF, 0x57, 0x33),
            contract: Color32::WHITE,
            neutral: Color32::from_rgb(0x9E, 0x9E, 0x9E),
            stroke: Color32::from_rgb(0xBA, 0x68, 0xC8),
            highlight: Color32::from_rgb(0, 212, 255),
            growth: Color32::from_rgb(0x4C, 0xAF, 0x50),
            drain: Color32::from_rgb(0xF4, 0x43, 0x36),
            warning: Color32::from_rgb(0xFF, 0x98, 0x00),
            edge_default: Color32::from_rgb(0x21, 0x96, 0xF3),
            edge_dash: [4.0, 2.0],
        }
    }
}

/// Sizes, widths and opacities used by the encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizSettings {
    pub min_radius: f32,
    pub max_radius: f32,
    pub main_radius: f32,
    pub selected_radius: f32,

    pub stroke_width: f32,
    pub main_stroke_width: f32,
    pub selected_stroke_width: f32,

    /// Lowest opacity a wallet with analytics can get.
    pub min_node_opacity: f32,
    /// Opacity of a wallet without analytics.
    pub default_node_opacity: f32,
    /// Lowest ramp intensity for a nonzero profitability.
    pub min_profit_intensity: f32,

    pub min_edge_width: f32,
    pub max_edge_width: f32,
    /// Age at which an edge reaches `stale_edge_opacity`.
    pub recency_window_secs: i64,
    pub fresh_edge_opacity: f32,
    pub stale_edge_opacity: f32,
    /// Opacity of an edge whose target has no analytics.
    pub unknown_edge_opacity: f32,

    pub palette: Palette,
}

impl Default for VizSettings {
    fn default() -> Self {
        Self {
            min_radius: 10.0,
            max_radius: 30.0,
            main_radius: 30.0,
            selected_radius: 20.0,
            stroke_width: 2.0,
            main_stroke_width: 10.0,
            selected_stroke_width: 4.0,
            min_node_opacity: 0.5,
            default_node_opacity: 0.5,
            min_profit_intensity: 0.5,
            min_edge_width: 3.0,
            max_edge_width: 7.0,
            recency_window_secs: 30 * 24 * 60 * 60,
            fresh_edge_opacity: 1.0,
            stale_edge_opacity: 0.3,
            unknown_edge_opacity: 0.2,
            palette: Palette::default(),
        }
    }
}
