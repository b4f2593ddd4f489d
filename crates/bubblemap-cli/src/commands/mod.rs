//! CLI command implementations.

pub mod config;
pub mod detail;
pub mod fetch;
pub mod render;
pub mod wallets;

use std::path::Path;

use anyhow::{Context, Result};
use bubblemap_viz::WalletApiClient;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;

/// Read and decode a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))
}

/// Write pretty JSON to `output`, or to stdout when absent.
pub(crate) fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub(crate) fn api_client(config: &Config) -> Result<WalletApiClient> {
    WalletApiClient::new(&config.server_url, config.timeout())
        .with_context(|| format!("Failed to create client for {}", config.server_url))
}
