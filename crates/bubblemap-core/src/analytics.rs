//! Externally supplied per-wallet analytics and the aggregates derived from them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::numeric::{lenient_f64, lenient_string, lenient_timestamp};
use crate::WalletGraph;

/// Category string marking a contract rather than an ordinary wallet.
pub const SMART_CONTRACT_CATEGORY: &str = "Smart Contract";

/// Precomputed metrics for one wallet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletAnalytics {
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    /// Signed profitability; malformed values decode as zero.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub profitability: f64,
    #[serde(default)]
    pub txs: Vec<Transaction>,
}

/// A transfer recorded for a wallet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, deserialize_with = "lenient_string")]
    pub from: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub to: String,
    /// Transferred amount. Sent as a numeric string upstream.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: f64,
    #[serde(default)]
    pub metadata: TransactionMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionMetadata {
    #[serde(
        rename = "blockTimestamp",
        default,
        deserialize_with = "lenient_timestamp"
    )]
    pub block_timestamp: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.metadata.block_timestamp
    }
}

/// Direction of a transfer relative to a given wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flow {
    Incoming,
    Outgoing,
}

/// Most recent transfer touching a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatestTransfer {
    pub timestamp: DateTime<Utc>,
    pub flow: Flow,
}

/// Aggregates derived from one [`WalletAnalytics`] entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WalletStats {
    pub category: String,
    pub profitability: f64,
    pub tx_count: usize,
    /// Sum of all transaction values.
    pub total_volume: f64,
    /// Sum of values sent to this wallet.
    pub incoming: f64,
    /// Sum of values sent from this wallet.
    pub outgoing: f64,
    pub latest: Option<LatestTransfer>,
}

impl WalletStats {
    fn from_analytics(entry: &WalletAnalytics) -> Self {
        let address = entry.address.trim();
        let mut stats = Self {
            category: entry.category.clone(),
            profitability: entry.profitability,
            tx_count: entry.txs.len(),
            ..Self::default()
        };

        for tx in &entry.txs {
            let value = tx.value.max(0.0);
            stats.total_volume += value;

            let incoming = tx.to.eq_ignore_ascii_case(address);
            let outgoing = tx.from.eq_ignore_ascii_case(address);
            if incoming {
                stats.incoming += value;
            }
            if outgoing {
                stats.outgoing += value;
            }

            let Some(timestamp) = tx.timestamp() else {
                continue;
            };
            if !incoming && !outgoing {
                continue;
            }
            let is_newer = stats
                .latest
                .map(|latest| timestamp > latest.timestamp)
                .unwrap_or(true);
            if is_newer {
                stats.latest = Some(LatestTransfer {
                    timestamp,
                    flow: if incoming { Flow::Incoming } else { Flow::Outgoing },
                });
            }
        }

        stats
    }

    /// Incoming minus outgoing volume.
    pub fn net_volume(&self) -> f64 {
        self.incoming - self.outgoing
    }

    pub fn is_smart_contract(&self) -> bool {
        self.category == SMART_CONTRACT_CATEGORY
    }
}

/// Case-insensitive address lookup over analytics entries.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsIndex {
    stats: HashMap<String, WalletStats>,
}

impl AnalyticsIndex {
    /// Index the given entries. A repeated address keeps the last entry.
    pub fn new(entries: &[WalletAnalytics]) -> Self {
        let mut stats = HashMap::with_capacity(entries.len());
        for entry in entries {
            let key = entry.address.trim().to_ascii_lowercase();
            if key.is_empty() {
                continue;
            }
            if stats
                .insert(key, WalletStats::from_analytics(entry))
                .is_some()
            {
                debug!(address = %entry.address, "analytics entry replaced");
            }
        }
        Self { stats }
    }

    pub fn get(&self, address: &str) -> Option<&WalletStats> {
        self.stats.get(&address.trim().to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WalletStats> {
        self.stats.values()
    }
}

/// Normalization bounds shared by every node and edge in a frame.
///
/// Each maximum over an empty collection is zero, never an infinite or
/// undefined extremum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Extremes {
    pub min_balance: f64,
    pub max_balance: f64,
    pub max_abs_profitability: f64,
    pub max_tx_count: usize,
    pub max_volume: f64,
}

impl Extremes {
    pub fn compute(graph: &WalletGraph, analytics: &AnalyticsIndex) -> Self {
        let mut balances = graph.nodes().iter().map(|node| sanitize(node.balance));
        let (min_balance, max_balance) = match balances.next() {
            Some(first) => balances.fold((first, first), |(lo, hi), b| (lo.min(b), hi.max(b))),
            None => (0.0, 0.0),
        };

        let mut extremes = Self {
            min_balance,
            max_balance,
            ..Self::default()
        };
        for stats in analytics.iter() {
            extremes.max_abs_profitability = extremes
                .max_abs_profitability
                .max(sanitize(stats.profitability.abs()));
            extremes.max_tx_count = extremes.max_tx_count.max(stats.tx_count);
            extremes.max_volume = extremes.max_volume.max(sanitize(stats.total_volume));
        }
        extremes
    }
}

/// Finite, non-negative.
fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
