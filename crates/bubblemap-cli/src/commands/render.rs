//! Headless rendering: build a session from files and print its frame.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bubblemap_core::{WalletAnalytics, WalletTree};
use bubblemap_viz::{fetch_detail, BubbleMapSession, DetailTicket};
use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use super::{api_client, read_json, write_json};
use crate::config::Config;

/// Inputs for `bm render`.
#[derive(Debug, Default)]
pub struct RenderOptions {
    pub tree: PathBuf,
    pub analytics: Option<PathBuf>,
    pub select: Option<String>,
    pub hide: Vec<String>,
    pub ticks: Option<u32>,
    pub fetch_detail: bool,
    pub now: Option<DateTime<Utc>>,
    pub output: Option<PathBuf>,
}

/// Load the tree and analytics into a session and apply selection and
/// visibility. The layout has not been run yet.
pub fn build_session(
    tree: &Path,
    analytics: Option<&Path>,
    hide: &[String],
) -> Result<(BubbleMapSession, Option<DetailTicket>)> {
    let tree: WalletTree = read_json(tree)?;
    let mut session = BubbleMapSession::default();

    if let Some(path) = analytics {
        let entries: Vec<WalletAnalytics> = read_json(path)?;
        session.set_analytics(&entries);
    }

    let ticket = session
        .set_input_tree(&tree)
        .context("Failed to initialize layout")?;

    for id in hide {
        session
            .toggle_visibility(id)
            .with_context(|| format!("Unknown wallet: {}", id))?;
    }

    Ok((session, ticket))
}

#[instrument(name = "render", skip_all, fields(tree = %options.tree.display()))]
pub async fn execute(config: &Config, options: RenderOptions) -> Result<()> {
    let (mut session, mut ticket) =
        build_session(&options.tree, options.analytics.as_deref(), &options.hide)?;

    if let Some(id) = options.select.as_deref() {
        if !session.graph().contains(id) {
            anyhow::bail!("Unknown wallet: {}", id);
        }
        ticket = session.select(id);
    }

    let max_ticks = options.ticks.unwrap_or(config.max_ticks);
    let ticks = session.run_until_settled(max_ticks);
    info!(ticks, settled = session.is_settled(), "Layout finished");
    if !session.is_settled() {
        warn!("Layout not settled after {} ticks", ticks);
    }

    if let Some(ticket) = ticket.filter(|_| options.fetch_detail) {
        let client = api_client(config)?;
        let (ticket, result) = fetch_detail(&client, ticket).await;
        session.resolve_detail(&ticket, result);
    }
    session.shutdown();

    let frame = session.frame(options.now.unwrap_or_else(Utc::now));
    write_json(&frame, options.output.as_deref())
}
