//! Nested wallet tree as returned by the wallet query endpoint.

use serde::{Deserialize, Serialize};

use crate::numeric::lenient_f64;

/// One wallet in the query result, with its related wallets nested below it.
///
/// Wire format: `{ address?: string, balance: number, nodes?: Tree[] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletTree {
    /// Wallet address. Missing or blank addresses get a synthetic id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Native-currency balance. Malformed values decode as zero.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub balance: f64,

    /// Related wallets.
    #[serde(default, rename = "nodes", alias = "children")]
    pub children: Vec<WalletTree>,
}

impl WalletTree {
    /// Create a leaf wallet.
    pub fn new(address: impl Into<String>, balance: f64) -> Self {
        Self {
            address: Some(address.into()),
            balance,
            children: Vec::new(),
        }
    }

    /// Create a leaf without an address.
    pub fn unnamed(balance: f64) -> Self {
        Self {
            address: None,
            balance,
            children: Vec::new(),
        }
    }

    /// Append a child wallet.
    pub fn with_child(mut self, child: WalletTree) -> Self {
        self.children.push(child);
        self
    }

    /// The address, ignoring blank strings.
    pub fn address(&self) -> Option<&str> {
        self.address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
    }

    /// Total number of wallets in this subtree, including `self`.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(WalletTree::len).sum::<usize>()
    }

    /// A tree always contains at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }
}
