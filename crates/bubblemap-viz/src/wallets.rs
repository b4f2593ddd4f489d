//! Side-panel wallet list and node summaries.

use bubblemap_core::{NodeId, VisibilityMap, WalletGraph, WalletNode};
use serde::Serialize;

/// One row of the wallet list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletListEntry {
    /// 1-based position after filtering and sorting.
    pub rank: usize,
    pub id: NodeId,
    pub address: Option<String>,
    pub short_address: String,
    pub balance: f64,
    pub balance_label: String,
    pub visible: bool,
    pub selected: bool,
}

/// The main wallet's direct counterparties, richest first.
///
/// `search` matches a case-insensitive address substring. An empty search
/// keeps every row, including wallets without an address.
pub fn wallet_list(
    graph: &WalletGraph,
    visibility: &VisibilityMap,
    selected: Option<&NodeId>,
    search: &str,
) -> Vec<WalletListEntry> {
    let Some(root) = graph.main_index() else {
        return Vec::new();
    };
    let needle = search.trim().to_ascii_lowercase();

    let mut rows: Vec<&WalletNode> = graph
        .children_of(root)
        .filter(|node| {
            needle.is_empty()
                || node
                    .address
                    .as_deref()
                    .is_some_and(|address| address.to_ascii_lowercase().contains(&needle))
        })
        .collect();
    rows.sort_by(|a, b| b.balance.total_cmp(&a.balance));

    rows.into_iter()
        .enumerate()
        .map(|(i, node)| WalletListEntry {
            rank: i + 1,
            id: node.id.clone(),
            address: node.address.clone(),
            short_address: short_address(node.address.as_deref()),
            balance: node.balance,
            balance_label: balance_label(node.balance),
            visible: visibility.is_visible(node.id.as_str()),
            selected: selected == Some(&node.id),
        })
        .collect()
}

/// `0x1234...abcd`, or "Unnamed Wallet".
pub fn short_address(address: Option<&str>) -> String {
    match address.map(str::trim).filter(|a| !a.is_empty()) {
        None => "Unnamed Wallet".to_string(),
        Some(address) if address.chars().count() <= 10 => address.to_string(),
        Some(address) => {
            let chars: Vec<char> = address.chars().collect();
            let head: String = chars[..6].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{head}...{tail}")
        }
    }
}

pub fn balance_label(balance: f64) -> String {
    let balance = if balance.is_finite() { balance } else { 0.0 };
    format!("{balance:.4} ETH")
}

/// Tooltip content for a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub address: String,
    pub balance: f64,
}

impl NodeSummary {
    pub fn of(node: &WalletNode) -> Self {
        Self {
            address: node.address.clone().unwrap_or_else(|| "N/A".to_string()),
            balance: node.balance,
        }
    }
}
