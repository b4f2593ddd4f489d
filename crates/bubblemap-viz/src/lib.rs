//! Visual encoding, interaction and session state for the wallet bubble map.
//!
//! The drawing surface is external: a host owns a [`BubbleMapSession`],
//! ticks it once per frame, forwards pointer input, and paints the
//! [`RenderFrame`] primitives with whatever backend it likes. Colors and
//! geometry use egui's types so an egui host can paint them directly.

pub mod api;
pub mod interaction;
pub mod render;
pub mod selection;
pub mod session;
pub mod settings;
pub mod wallets;

pub use api::{validate_address, ApiError, WalletApiClient};
pub use interaction::{CursorHint, Intent, InteractionLayer, PointerEvent, Viewport};
pub use render::{
    group_color, resolve_edge_visuals, resolve_node_visuals, ArrowDirection, EdgeRenderContext,
    EdgeVisuals, NodeRenderContext, NodeVisuals,
};
pub use selection::{
    fetch_detail, DetailError, DetailState, DetailTicket, SelectionController, TokenBalance,
    WalletDetail, WalletDetailSource,
};
pub use session::{BubbleMapSession, EdgePrimitive, NodeMarker, NodePrimitive, RenderFrame};
pub use settings::{Palette, VizSettings};
pub use wallets::{balance_label, short_address, wallet_list, NodeSummary, WalletListEntry};
