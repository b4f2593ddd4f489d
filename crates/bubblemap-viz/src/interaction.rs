//! Pointer gestures, pan/zoom viewport and cursor hints.

use egui::{pos2, CursorIcon, Pos2, Vec2};
use serde::{Deserialize, Serialize};

/// Pointer travel below which a press-release on a node counts as a click.
pub const CLICK_TOLERANCE: f32 = 3.0;

/// Screen ↔ world transform. `screen = world * scale + translation`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub translation: Vec2,
    pub scale: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            translation: Vec2::ZERO,
            scale: 1.0,
            min_scale: 1.0,
            max_scale: 10.0,
        }
    }
}

impl Viewport {
    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        pos2(
            (screen.x - self.translation.x) / self.scale,
            (screen.y - self.translation.y) / self.scale,
        )
    }

    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        pos2(
            world.x * self.scale + self.translation.x,
            world.y * self.scale + self.translation.y,
        )
    }

    /// Zoom by a wheel delta, keeping `anchor` (screen) over the same world point.
    pub fn zoom_at(&mut self, wheel_delta: f32, anchor: Pos2) {
        let world = self.screen_to_world(anchor);
        let factor = 2f32.powf(-wheel_delta * 0.002);
        self.scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        self.translation = Vec2::new(
            anchor.x - world.x * self.scale,
            anchor.y - world.y * self.scale,
        );
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.translation += delta;
    }

    pub fn reset(&mut self) {
        self.translation = Vec2::ZERO;
        self.scale = 1.0;
    }
}

/// Raw input from the host, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Enter { pos: Pos2 },
    Leave,
    Down { pos: Pos2 },
    Move { pos: Pos2 },
    Up { pos: Pos2 },
    Wheel { delta: f32, pos: Pos2 },
}

/// What a gesture asks the session to do. Positions are in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    DragStart { node: usize, at: Pos2 },
    DragMove { node: usize, at: Pos2 },
    DragEnd { node: usize },
    Select { node: usize },
}

/// Cosmetic cursor state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorHint {
    #[default]
    Default,
    Grab,
    Grabbing,
}

impl From<CursorHint> for CursorIcon {
    fn from(hint: CursorHint) -> Self {
        match hint {
            CursorHint::Default => CursorIcon::Default,
            CursorHint::Grab => CursorIcon::Grab,
            CursorHint::Grabbing => CursorIcon::Grabbing,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Gesture {
    #[default]
    Idle,
    NodePress {
        node: usize,
        origin: Pos2,
        travel: f32,
    },
    Panning {
        last: Pos2,
    },
}

/// Turns pointer events into viewport changes and [`Intent`]s.
#[derive(Debug, Clone, Default)]
pub struct InteractionLayer {
    viewport: Viewport,
    gesture: Gesture,
    cursor: CursorHint,
    hovered: Option<usize>,
}

impl InteractionLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one event. `hit_test` maps a world position to the topmost
    /// visible node under it.
    pub fn handle<F>(&mut self, event: PointerEvent, hit_test: F) -> Vec<Intent>
    where
        F: Fn(Pos2) -> Option<usize>,
    {
        let mut intents = Vec::new();

        match event {
            PointerEvent::Enter { pos } | PointerEvent::Move { pos } => match self.gesture {
                Gesture::NodePress {
                    node,
                    origin,
                    travel,
                } => {
                    self.gesture = Gesture::NodePress {
                        node,
                        origin,
                        travel: travel.max(origin.distance(pos)),
                    };
                    intents.push(Intent::DragMove {
                        node,
                        at: self.viewport.screen_to_world(pos),
                    });
                }
                Gesture::Panning { last } => {
                    self.viewport.pan(pos - last);
                    self.gesture = Gesture::Panning { last: pos };
                }
                Gesture::Idle => {
                    self.hovered = hit_test(self.viewport.screen_to_world(pos));
                    self.cursor = if self.hovered.is_some() {
                        CursorHint::Grab
                    } else {
                        CursorHint::Default
                    };
                }
            },
            PointerEvent::Down { pos } => {
                let world = self.viewport.screen_to_world(pos);
                self.gesture = match hit_test(world) {
                    Some(node) => {
                        intents.push(Intent::DragStart { node, at: world });
                        Gesture::NodePress {
                            node,
                            origin: pos,
                            travel: 0.0,
                        }
                    }
                    None => Gesture::Panning { last: pos },
                };
                self.cursor = CursorHint::Grabbing;
            }
            PointerEvent::Up { pos } => {
                if let Gesture::NodePress {
                    node,
                    origin,
                    travel,
                } = self.gesture
                {
                    intents.push(Intent::DragEnd { node });
                    let travel = travel.max(origin.distance(pos));
                    let released_on = hit_test(self.viewport.screen_to_world(pos));
                    if travel < CLICK_TOLERANCE && released_on == Some(node) {
                        intents.push(Intent::Select { node });
                    }
                }
                self.gesture = Gesture::Idle;
                self.cursor = CursorHint::Grab;
            }
            PointerEvent::Leave => {
                if let Gesture::NodePress { node, .. } = self.gesture {
                    intents.push(Intent::DragEnd { node });
                }
                self.gesture = Gesture::Idle;
                self.hovered = None;
                self.cursor = CursorHint::Default;
            }
            PointerEvent::Wheel { delta, pos } => {
                self.viewport.zoom_at(delta, pos);
            }
        }

        intents
    }

    /// Abort a gesture in progress, e.g. when the graph is replaced.
    pub fn reset_gesture(&mut self) {
        self.gesture = Gesture::Idle;
        self.hovered = None;
        self.cursor = CursorHint::Default;
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn cursor(&self) -> CursorHint {
        self.cursor
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Node currently pressed or dragged.
    pub fn active_node(&self) -> Option<usize> {
        match self.gesture {
            Gesture::NodePress { node, .. } => Some(node),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One node of radius 10 at the world origin.
    fn hit(p: Pos2) -> Option<usize> {
        (p.to_vec2().length() <= 10.0).then_some(0)
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut viewport = Viewport::default();
        viewport.zoom_at(-100_000.0, Pos2::ZERO);
        assert_eq!(viewport.scale, 10.0);
        viewport.zoom_at(100_000.0, Pos2::ZERO);
        assert_eq!(viewport.scale, 1.0);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut viewport = Viewport::default();
        let anchor = pos2(120.0, 80.0);
        let before = viewport.screen_to_world(anchor);
        viewport.zoom_at(-500.0, anchor);
        assert!((viewport.scale - 2.0).abs() < 1e-5);
        let after = viewport.screen_to_world(anchor);
        assert!(before.distance(after) < 1e-3);
    }

    #[test]
    fn test_screen_world_inverse() {
        let viewport = Viewport {
            translation: Vec2::new(30.0, -12.0),
            scale: 2.5,
            ..Viewport::default()
        };
        let p = pos2(17.0, 4.0);
        let back = viewport.screen_to_world(viewport.world_to_screen(p));
        assert!(p.distance(back) < 1e-4);
    }

    #[test]
    fn test_click_selects() {
        let mut layer = InteractionLayer::new();
        let down = layer.handle(PointerEvent::Down { pos: pos2(1.0, 1.0) }, hit);
        assert_eq!(
            down,
            vec![Intent::DragStart {
                node: 0,
                at: pos2(1.0, 1.0)
            }]
        );
        assert_eq!(layer.cursor(), CursorHint::Grabbing);

        let up = layer.handle(PointerEvent::Up { pos: pos2(2.0, 2.0) }, hit);
        assert_eq!(up, vec![Intent::DragEnd { node: 0 }, Intent::Select { node: 0 }]);
        assert_eq!(layer.cursor(), CursorHint::Grab);
    }

    #[test]
    fn test_drag_does_not_select() {
        let mut layer = InteractionLayer::new();
        layer.handle(PointerEvent::Down { pos: pos2(0.0, 0.0) }, hit);
        let moved = layer.handle(PointerEvent::Move { pos: pos2(8.0, 0.0) }, hit);
        assert_eq!(
            moved,
            vec![Intent::DragMove {
                node: 0,
                at: pos2(8.0, 0.0)
            }]
        );
        layer.handle(PointerEvent::Move { pos: pos2(1.0, 0.0) }, hit);
        let up = layer.handle(PointerEvent::Up { pos: pos2(1.0, 0.0) }, hit);
        assert_eq!(up, vec![Intent::DragEnd { node: 0 }]);
    }

    #[test]
    fn test_background_drag_pans() {
        let mut layer = InteractionLayer::new();
        assert!(layer
            .handle(PointerEvent::Down { pos: pos2(100.0, 100.0) }, hit)
            .is_empty());
        layer.handle(PointerEvent::Move { pos: pos2(130.0, 90.0) }, hit);
        layer.handle(PointerEvent::Up { pos: pos2(130.0, 90.0) }, hit);
        assert_eq!(layer.viewport().translation, Vec2::new(30.0, -10.0));
    }

    #[test]
    fn test_hover_cursor() {
        let mut layer = InteractionLayer::new();
        layer.handle(PointerEvent::Move { pos: pos2(3.0, 3.0) }, hit);
        assert_eq!(layer.cursor(), CursorHint::Grab);
        assert_eq!(layer.hovered(), Some(0));
        layer.handle(PointerEvent::Move { pos: pos2(50.0, 50.0) }, hit);
        assert_eq!(layer.cursor(), CursorHint::Default);
        assert_eq!(CursorIcon::from(CursorHint::Grabbing), CursorIcon::Grabbing);
    }

    #[test]
    fn test_leave_releases_drag() {
        let mut layer = InteractionLayer::new();
        layer.handle(PointerEvent::Down { pos: pos2(0.0, 0.0) }, hit);
        assert_eq!(layer.active_node(), Some(0));
        let out = layer.handle(PointerEvent::Leave, hit);
        assert_eq!(out, vec![Intent::DragEnd { node: 0 }]);
        assert_eq!(layer.active_node(), None);
    }

    #[test]
    fn test_hit_testing_uses_world_space() {
        let mut layer = InteractionLayer::new();
        layer.viewport_mut().pan(Vec2::new(200.0, 0.0));
        assert!(layer
            .handle(PointerEvent::Down { pos: pos2(0.0, 0.0) }, hit)
            .is_empty());
        layer.handle(PointerEvent::Up { pos: pos2(0.0, 0.0) }, hit);
        let down = layer.handle(PointerEvent::Down { pos: pos2(200.0, 0.0) }, hit);
        assert_eq!(down.len(), 1);
    }
}
