//! Node/edge visual encoding.
//!
//! Pure functions from a render context to visuals. Nothing here touches the
//! graph or the layout; every output is finite even for empty analytics.

use bubblemap_core::{Extremes, Flow, WalletStats};
use chrono::{DateTime, Utc};
use egui::{Color32, Stroke};
use serde::{Deserialize, Serialize};

use crate::settings::VizSettings;

/// ColorBrewer sequential Greens, light to dark.
const GREENS: [u32; 9] = [
    0xf7fcf5, 0xe5f5e0, 0xc7e9c0, 0xa1d99b, 0x74c476, 0x41ab5d, 0x238b45, 0x006d2c, 0x00441b,
];

/// ColorBrewer sequential Reds, light to dark.
const REDS: [u32; 9] = [
    0xfff5f0, 0xfee0d2, 0xfcbba1, 0xfc9272, 0xfb6a4a, 0xef3b2c, 0xcb181d, 0xa50f15, 0x67000d,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeVisuals {
    pub radius: f32,
    pub fill: Color32,
    pub opacity: f32,
    pub stroke: Stroke,
}

#[derive(Debug, Clone, Copy)]
pub struct NodeRenderContext<'a> {
    pub balance: f64,
    pub is_main_wallet: bool,
    pub selected: bool,
    /// Analytics for this wallet, if any.
    pub stats: Option<&'a WalletStats>,
    pub extremes: &'a Extremes,
    pub settings: &'a VizSettings,
}

/// Which way an edge's arrowhead points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowDirection {
    /// Source to target.
    Forward,
    /// Target to source.
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeVisuals {
    pub stroke: Stroke,
    pub opacity: f32,
    pub arrow: ArrowDirection,
}

#[derive(Debug, Clone, Copy)]
pub struct EdgeRenderContext<'a> {
    /// Analytics for the edge's target wallet, if any.
    pub target_stats: Option<&'a WalletStats>,
    pub extremes: &'a Extremes,
    pub settings: &'a VizSettings,
    pub now: DateTime<Utc>,
}

pub fn resolve_node_visuals(ctx: NodeRenderContext<'_>) -> NodeVisuals {
    let settings = ctx.settings;
    let palette = &settings.palette;

    let radius = if ctx.selected {
        settings.selected_radius
    } else if ctx.is_main_wallet {
        settings.main_radius
    } else {
        balance_radius(ctx.balance, ctx.extremes, settings)
    };

    let fill = if ctx.is_main_wallet {
        palette.accent
    } else {
        match ctx.stats {
            Some(stats) if stats.is_smart_contract() => palette.contract,
            Some(stats) => profitability_color(stats.profitability, ctx.extremes, settings),
            None => palette.neutral,
        }
    };

    let opacity = if ctx.is_main_wallet {
        1.0
    } else {
        ctx.stats
            .map(|stats| activity_opacity(stats.tx_count, ctx.extremes, settings))
            .unwrap_or(settings.default_node_opacity)
    };

    let stroke = if ctx.selected {
        Stroke::new(settings.selected_stroke_width, palette.highlight)
    } else if ctx.is_main_wallet {
        Stroke::new(settings.main_stroke_width, palette.stroke)
    } else {
        Stroke::new(settings.stroke_width, palette.stroke)
    };

    NodeVisuals {
        radius,
        fill,
        opacity,
        stroke,
    }
}

pub fn resolve_edge_visuals(ctx: EdgeRenderContext<'_>) -> EdgeVisuals {
    let settings = ctx.settings;
    let palette = &settings.palette;

    let Some(stats) = ctx.target_stats else {
        return EdgeVisuals {
            stroke: Stroke::new(settings.min_edge_width, palette.edge_default),
            opacity: settings.unknown_edge_opacity,
            arrow: ArrowDirection::Forward,
        };
    };

    let width = if ctx.extremes.max_volume > 0.0 {
        let t = (finite(stats.total_volume) / ctx.extremes.max_volume).clamp(0.0, 1.0) as f32;
        settings.min_edge_width + t * (settings.max_edge_width - settings.min_edge_width)
    } else {
        settings.min_edge_width
    };

    let net = finite(stats.net_volume());
    let color = if net > 0.0 {
        palette.growth
    } else if net < 0.0 {
        palette.drain
    } else {
        palette.warning
    };

    let opacity = match stats.latest {
        Some(latest) => recency_opacity(latest.timestamp, ctx.now, settings),
        None => settings.unknown_edge_opacity,
    };

    let arrow = match stats.latest.map(|latest| latest.flow) {
        Some(Flow::Outgoing) => ArrowDirection::Reverse,
        Some(Flow::Incoming) | None => ArrowDirection::Forward,
    };

    EdgeVisuals {
        stroke: Stroke::new(width, color),
        opacity,
        arrow,
    }
}

/// Log scale of `balance + 1` over the graph's balance range.
pub fn balance_radius(balance: f64, extremes: &Extremes, settings: &VizSettings) -> f32 {
    let lo = (finite(extremes.min_balance).max(0.0) + 1.0).ln();
    let hi = (finite(extremes.max_balance).max(0.0) + 1.0).ln();
    if hi - lo <= f64::EPSILON {
        return settings.min_radius;
    }

    let value = (finite(balance).max(0.0) + 1.0).ln();
    let t = ((value - lo) / (hi - lo)).clamp(0.0, 1.0) as f32;
    settings.min_radius + t * (settings.max_radius - settings.min_radius)
}

fn profitability_color(profitability: f64, extremes: &Extremes, settings: &VizSettings) -> Color32 {
    let profitability = finite(profitability);
    if profitability == 0.0 || extremes.max_abs_profitability <= 0.0 {
        return settings.palette.neutral;
    }

    let magnitude = profitability.abs() / extremes.max_abs_profitability;
    let t = magnitude.max(settings.min_profit_intensity as f64).min(1.0);
    if profitability > 0.0 {
        ramp(&GREENS, t)
    } else {
        ramp(&REDS, t)
    }
}

fn activity_opacity(tx_count: usize, extremes: &Extremes, settings: &VizSettings) -> f32 {
    if extremes.max_tx_count == 0 {
        return settings.min_node_opacity;
    }
    let ratio = (tx_count as f32 / extremes.max_tx_count as f32).min(1.0);
    ratio.max(settings.min_node_opacity)
}

/// Linear fade from fresh to stale across the recency window.
pub fn recency_opacity(timestamp: DateTime<Utc>, now: DateTime<Utc>, settings: &VizSettings) -> f32 {
    let window = settings.recency_window_secs.max(1) as f64;
    let age = (now - timestamp).num_milliseconds() as f64 / 1000.0;
    let t = (age / window).clamp(0.0, 1.0) as f32;
    settings.fresh_edge_opacity + t * (settings.stale_edge_opacity - settings.fresh_edge_opacity)
}

/// Rainbow ramp keyed by branch group, for hosts without analytics.
pub fn group_color(group: u32) -> Color32 {
    let t = (group as f64 / 10.0).fract();
    let ts = (t - 0.5).abs();
    cubehelix(360.0 * t - 100.0, 1.5 - 1.5 * ts, 0.8 - 0.9 * ts)
}

fn cubehelix(hue: f64, saturation: f64, lightness: f64) -> Color32 {
    let h = (hue + 120.0).to_radians();
    let a = saturation * lightness * (1.0 - lightness);
    let (cos_h, sin_h) = (h.cos(), h.sin());
    let channel = |v: f64| (255.0 * v).round().clamp(0.0, 255.0) as u8;
    Color32::from_rgb(
        channel(lightness + a * (-0.14861 * cos_h + 1.78277 * sin_h)),
        channel(lightness + a * (-0.29227 * cos_h - 0.90649 * sin_h)),
        channel(lightness + a * (1.97294 * cos_h)),
    )
}

/// Uniform B-spline through the ramp's stops, `t` in `[0, 1]`.
fn ramp(stops: &[u32; 9], t: f64) -> Color32 {
    let channel = |shift: u32| -> u8 {
        let values: Vec<f64> = stops.iter().map(|c| ((c >> shift) & 0xff) as f64).collect();
        basis_spline(&values, t).round().clamp(0.0, 255.0) as u8
    };
    Color32::from_rgb(channel(16), channel(8), channel(0))
}

fn basis_spline(values: &[f64], t: f64) -> f64 {
    let n = values.len() - 1;
    let t = t.clamp(0.0, 1.0);
    let i = if t >= 1.0 {
        n - 1
    } else {
        (t * n as f64).floor() as usize
    };
    let v1 = values[i];
    let v2 = values[i + 1];
    let v0 = if i > 0 { values[i - 1] } else { 2.0 * v1 - v2 };
    let v3 = if i < n - 1 { values[i + 2] } else { 2.0 * v2 - v1 };

    let t1 = (t - i as f64 / n as f64) * n as f64;
    let t2 = t1 * t1;
    let t3 = t2 * t1;
    ((1.0 - 3.0 * t1 + 3.0 * t2 - t3) * v0
        + (4.0 - 6.0 * t2 + 3.0 * t3) * v1
        + (1.0 + 3.0 * t1 + 3.0 * t2 - 3.0 * t3) * v2
        + t3 * v3)
        / 6.0
}

fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// `#RRGGBB`, alpha dropped.
pub fn hex(color: Color32) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r(), color.g(), color.b())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubblemap_core::LatestTransfer;
    use chrono::Duration;

    fn extremes() -> Extremes {
        Extremes {
            min_balance: 0.0,
            max_balance: 100.0,
            max_abs_profitability: 4.0,
            max_tx_count: 10,
            max_volume: 20.0,
        }
    }

    fn stats(profitability: f64, tx_count: usize) -> WalletStats {
        WalletStats {
            category: "Wallet".into(),
            profitability,
            tx_count,
            ..WalletStats::default()
        }
    }

    fn node_ctx<'a>(
        stats: Option<&'a WalletStats>,
        extremes: &'a Extremes,
        settings: &'a VizSettings,
    ) -> NodeRenderContext<'a> {
        NodeRenderContext {
            balance: 10.0,
            is_main_wallet: false,
            selected: false,
            stats,
            extremes,
            settings,
        }
    }

    #[test]
    fn test_radius_log_scale() {
        let settings = VizSettings::default();
        let e = extremes();
        assert_eq!(balance_radius(0.0, &e, &settings), 10.0);
        assert_eq!(balance_radius(100.0, &e, &settings), 30.0);
        assert_eq!(balance_radius(1_000.0, &e, &settings), 30.0);
        assert_eq!(balance_radius(-5.0, &e, &settings), 10.0);
        assert_eq!(balance_radius(f64::NAN, &e, &settings), 10.0);

        let mid = balance_radius(9.0, &e, &settings);
        let expected = 10.0 + 20.0 * (10f64.ln() / 101f64.ln()) as f32;
        assert!((mid - expected).abs() < 1e-4);
    }

    #[test]
    fn test_radius_monotonic() {
        let settings = VizSettings::default();
        let e = extremes();
        let mut last = 0.0;
        for balance in [0.0, 0.5, 1.0, 3.0, 9.0, 27.0, 80.0, 100.0] {
            let r = balance_radius(balance, &e, &settings);
            assert!(r >= last);
            last = r;
        }
    }

    #[test]
    fn test_radius_degenerate_domain() {
        let settings = VizSettings::default();
        let e = Extremes {
            min_balance: 5.0,
            max_balance: 5.0,
            ..Extremes::default()
        };
        assert_eq!(balance_radius(5.0, &e, &settings), settings.min_radius);
    }

    #[test]
    fn test_selected_radius_wins_over_main() {
        let settings = VizSettings::default();
        let e = extremes();
        let mut ctx = node_ctx(None, &e, &settings);
        ctx.is_main_wallet = true;
        let visuals = resolve_node_visuals(ctx);
        assert_eq!(visuals.radius, 30.0);
        assert_eq!(visuals.stroke.width, 10.0);

        ctx.selected = true;
        let visuals = resolve_node_visuals(ctx);
        assert_eq!(visuals.radius, 20.0);
        assert_eq!(visuals.stroke.width, 4.0);
        assert_eq!(visuals.stroke.color, settings.palette.highlight);
    }

    #[test]
    fn test_fill_priority() {
        let settings = VizSettings::default();
        let e = extremes();
        let palette = &settings.palette;

        let mut contract = stats(3.0, 1);
        contract.category = "Smart Contract".into();
        assert_eq!(
            resolve_node_visuals(node_ctx(Some(&contract), &e, &settings)).fill,
            palette.contract
        );

        let mut main = node_ctx(Some(&contract), &e, &settings);
        main.is_main_wallet = true;
        assert_eq!(resolve_node_visuals(main).fill, palette.accent);

        let flat = stats(0.0, 1);
        assert_eq!(resolve_node_visuals(node_ctx(Some(&flat), &e, &settings)).fill, palette.neutral);
        assert_eq!(resolve_node_visuals(node_ctx(None, &e, &settings)).fill, palette.neutral);
    }

    #[test]
    fn test_profitability_ramps() {
        let settings = VizSettings::default();
        let e = extremes();

        let loss = stats(-4.0, 1);
        let fill = resolve_node_visuals(node_ctx(Some(&loss), &e, &settings)).fill;
        assert_eq!(hex(fill), "#67000D");

        let gain = stats(4.0, 1);
        let fill = resolve_node_visuals(node_ctx(Some(&gain), &e, &settings)).fill;
        assert_eq!(hex(fill), "#00441B");

        // Small magnitudes are floored to the middle of the ramp.
        let small = stats(0.1, 1);
        let floored = stats(2.0, 1);
        assert_eq!(
            resolve_node_visuals(node_ctx(Some(&small), &e, &settings)).fill,
            resolve_node_visuals(node_ctx(Some(&floored), &e, &settings)).fill
        );
    }

    #[test]
    fn test_ramp_endpoints() {
        assert_eq!(hex(ramp(&GREENS, 0.0)), "#F7FCF5");
        assert_eq!(hex(ramp(&REDS, 1.0)), "#67000D");
    }

    #[test]
    fn test_node_opacity() {
        let settings = VizSettings::default();
        let e = extremes();

        let busy = stats(1.0, 10);
        let quiet = stats(1.0, 1);
        let mid = stats(1.0, 8);
        assert_eq!(resolve_node_visuals(node_ctx(Some(&busy), &e, &settings)).opacity, 1.0);
        assert_eq!(resolve_node_visuals(node_ctx(Some(&quiet), &e, &settings)).opacity, 0.5);
        assert!((resolve_node_visuals(node_ctx(Some(&mid), &e, &settings)).opacity - 0.8).abs() < 1e-6);
        assert_eq!(resolve_node_visuals(node_ctx(None, &e, &settings)).opacity, 0.5);

        let mut main = node_ctx(None, &e, &settings);
        main.is_main_wallet = true;
        assert_eq!(resolve_node_visuals(main).opacity, 1.0);
        assert_eq!(resolve_node_visuals(main).stroke.width, 10.0);
    }

    #[test]
    fn test_empty_analytics_node_is_finite() {
        let settings = VizSettings::default();
        let e = Extremes::default();
        let s = stats(5.0, 3);
        let visuals = resolve_node_visuals(node_ctx(Some(&s), &e, &settings));
        assert!(visuals.radius.is_finite());
        assert!(visuals.opacity.is_finite());
        assert_eq!(visuals.fill, settings.palette.neutral);
    }

    #[test]
    fn test_edge_defaults_without_analytics() {
        let settings = VizSettings::default();
        let e = extremes();
        let visuals = resolve_edge_visuals(EdgeRenderContext {
            target_stats: None,
            extremes: &e,
            settings: &settings,
            now: Utc::now(),
        });
        assert_eq!(visuals.stroke.width, 3.0);
        assert_eq!(visuals.stroke.color, settings.palette.edge_default);
        assert_eq!(visuals.opacity, 0.2);
        assert_eq!(visuals.arrow, ArrowDirection::Forward);
    }

    #[test]
    fn test_edge_width_color_arrow() {
        let settings = VizSettings::default();
        let e = extremes();
        let now = Utc::now();

        let mut target = stats(1.0, 2);
        target.total_volume = 10.0;
        target.incoming = 3.0;
        target.outgoing = 7.0;
        target.latest = Some(LatestTransfer {
            timestamp: now,
            flow: Flow::Outgoing,
        });

        let ctx = EdgeRenderContext {
            target_stats: Some(&target),
            extremes: &e,
            settings: &settings,
            now,
        };
        let visuals = resolve_edge_visuals(ctx);
        assert_eq!(visuals.stroke.width, 5.0);
        assert_eq!(visuals.stroke.color, settings.palette.drain);
        assert_eq!(visuals.arrow, ArrowDirection::Reverse);

        target.incoming = 7.0;
        target.outgoing = 7.0;
        let visuals = resolve_edge_visuals(EdgeRenderContext {
            target_stats: Some(&target),
            extremes: &e,
            settings: &settings,
            now,
        });
        assert_eq!(visuals.stroke.color, settings.palette.warning);
    }

    #[test]
    fn test_arrow_follows_latest_flow() {
        let settings = VizSettings::default();
        let e = extremes();
        let now = Utc::now();
        let arrow = |flow| {
            let mut target = stats(0.0, 2);
            target.latest = Some(LatestTransfer {
                timestamp: now,
                flow,
            });
            resolve_edge_visuals(EdgeRenderContext {
                target_stats: Some(&target),
                extremes: &e,
                settings: &settings,
                now,
            })
            .arrow
        };

        assert_eq!(arrow(Flow::Incoming), ArrowDirection::Forward);
        assert_eq!(arrow(Flow::Outgoing), ArrowDirection::Reverse);
    }

    #[test]
    fn test_edge_width_zero_volume() {
        let settings = VizSettings::default();
        let e = Extremes::default();
        let target = stats(0.0, 0);
        let visuals = resolve_edge_visuals(EdgeRenderContext {
            target_stats: Some(&target),
            extremes: &e,
            settings: &settings,
            now: Utc::now(),
        });
        assert_eq!(visuals.stroke.width, 3.0);
        assert_eq!(visuals.opacity, 0.2);
    }

    #[test]
    fn test_recency_opacity() {
        let settings = VizSettings::default();
        let now = Utc::now();
        assert!((recency_opacity(now, now, &settings) - 1.0).abs() < 1e-6);
        assert!((recency_opacity(now - Duration::days(15), now, &settings) - 0.65).abs() < 1e-4);
        assert!((recency_opacity(now - Duration::days(30), now, &settings) - 0.3).abs() < 1e-6);
        assert!((recency_opacity(now - Duration::days(400), now, &settings) - 0.3).abs() < 1e-6);
        assert!((recency_opacity(now + Duration::days(1), now, &settings) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_group_color_varies() {
        assert_ne!(group_color(1), group_color(4));
        assert_eq!(group_color(3), group_color(13));
    }
}
