//! Selection state and wallet detail fetching.
//!
//! Selecting a node issues a [`DetailTicket`]. The host runs the request
//! (see [`fetch_detail`]) and hands the outcome back through
//! [`SelectionController::resolve`]; only the ticket of the latest selection
//! is applied, so a slow response can never overwrite a newer one.

use async_trait::async_trait;
use bubblemap_core::{lenient_f64, NodeId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Detail payload for one wallet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletDetail {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub native_balance: f64,
    #[serde(default)]
    pub token_balances: Vec<TokenBalance>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    #[serde(default)]
    pub token_symbol: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub balance: f64,
}

/// Why a detail request failed. Display text is shown to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetailError {
    #[error("Please enter a valid wallet address.")]
    InvalidAddress,

    #[error("Failed to fetch wallet data: {0}")]
    Transport(String),

    #[error("Failed to fetch wallet data (HTTP {0})")]
    Status(u16),

    #[error("Unexpected wallet data: {0}")]
    Decode(String),
}

/// Lifecycle of the detail panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailState {
    #[default]
    Idle,
    Loading {
        address: String,
    },
    Loaded {
        address: String,
        detail: WalletDetail,
    },
    Failed {
        address: String,
        message: String,
    },
}

impl DetailState {
    pub fn is_loading(&self) -> bool {
        matches!(self, DetailState::Loading { .. })
    }
}

/// Names the single detail request the host must issue for a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailTicket {
    pub generation: u64,
    pub address: String,
}

/// Anything that can fetch wallet detail.
#[async_trait]
pub trait WalletDetailSource: Send + Sync {
    async fn wallet_detail(&self, address: &str) -> Result<WalletDetail, DetailError>;
}

/// Run `ticket`'s request against `source`, returning both for
/// [`SelectionController::resolve`].
pub async fn fetch_detail<S>(
    source: &S,
    ticket: DetailTicket,
) -> (DetailTicket, Result<WalletDetail, DetailError>)
where
    S: WalletDetailSource + ?Sized,
{
    let result = source.wallet_detail(&ticket.address).await;
    (ticket, result)
}

/// Single-node selection with last-request-wins detail loading.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    selected: Option<NodeId>,
    generation: u64,
    detail: DetailState,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `id` and start loading detail for `address`.
    pub fn select(&mut self, id: NodeId, address: &str) -> DetailTicket {
        self.generation += 1;
        self.selected = Some(id);
        self.detail = DetailState::Loading {
            address: address.to_string(),
        };
        DetailTicket {
            generation: self.generation,
            address: address.to_string(),
        }
    }

    /// Apply a finished request. Returns false when the ticket is stale.
    pub fn resolve(
        &mut self,
        ticket: &DetailTicket,
        result: Result<WalletDetail, DetailError>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                address = %ticket.address,
                ticket = ticket.generation,
                current = self.generation,
                "Discarding stale wallet detail"
            );
            return false;
        }

        let address = ticket.address.clone();
        self.detail = match result {
            Ok(detail) => DetailState::Loaded { address, detail },
            Err(err) => {
                tracing::warn!(address = %address, "Wallet detail failed: {}", err);
                DetailState::Failed {
                    address,
                    message: err.to_string(),
                }
            }
        };
        true
    }

    /// Invalidate any request in flight, keeping the selected id.
    pub fn cancel(&mut self) {
        self.generation += 1;
        if self.detail.is_loading() {
            self.detail = DetailState::Idle;
        }
    }

    /// Drop the selection entirely.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.selected = None;
        self.detail = DetailState::Idle;
    }

    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_ref().map(NodeId::as_str) == Some(id)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn detail(&self) -> &DetailState {
        &self.detail
    }
}
