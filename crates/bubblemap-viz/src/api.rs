//! HTTP client for the wallet server.
//!
//! - `GET  {server}/api/wallet/{address}` returns the [`WalletTree`] rooted at `address`.
//! - `POST {server}/api/wallet/data` with `{ "address": ... }` returns [`WalletDetail`].

use std::time::Duration;

use async_trait::async_trait;
use bubblemap_core::WalletTree;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::selection::{DetailError, WalletDetail, WalletDetailSource};

/// Errors from the wallet server client.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Please enter a valid wallet address.")]
    InvalidAddress,

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned HTTP {0}")]
    Status(u16),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl From<ApiError> for DetailError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidAddress => DetailError::InvalidAddress,
            ApiError::Status(code) => DetailError::Status(code),
            ApiError::Http(err) if err.is_decode() => DetailError::Decode(err.to_string()),
            other => DetailError::Transport(other.to_string()),
        }
    }
}

/// Trim `input`, rejecting blank addresses.
pub fn validate_address(input: &str) -> Result<&str> {
    let address = input.trim();
    if address.is_empty() {
        Err(ApiError::InvalidAddress)
    } else {
        Ok(address)
    }
}

#[derive(Debug, Serialize)]
struct DetailRequest<'a> {
    address: &'a str,
}

/// Client for the wallet server's REST API.
#[derive(Debug, Clone)]
pub struct WalletApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl WalletApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidUrl(base_url));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tree_url(&self, address: &str) -> String {
        format!("{}/api/wallet/{}", self.base_url, address)
    }

    pub fn detail_url(&self) -> String {
        format!("{}/api/wallet/data", self.base_url)
    }

    /// Fetch the wallet tree rooted at `address`.
    pub async fn fetch_tree(&self, address: &str) -> Result<WalletTree> {
        let address = validate_address(address)?;
        let url = self.tree_url(address);
        debug!(%url, "Fetching wallet tree");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let tree: WalletTree = response.json().await?;
        info!(address, wallets = tree.len(), "Fetched wallet tree");
        Ok(tree)
    }

    /// Fetch balances for one wallet.
    pub async fn fetch_detail(&self, address: &str) -> Result<WalletDetail> {
        let address = validate_address(address)?;
        debug!(address, "Fetching wallet detail");

        let response = self
            .http
            .post(self.detail_url())
            .json(&DetailRequest { address })
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl WalletDetailSource for WalletApiClient {
    async fn wallet_detail(&self, address: &str) -> std::result::Result<WalletDetail, DetailError> {
        self.fetch_detail(address).await.map_err(DetailError::from)
    }
}
