//! Fetch a wallet tree from the server.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use super::{api_client, write_json};
use crate::config::Config;

#[instrument(name = "fetch", skip_all, fields(address = %address.trim()))]
pub async fn execute(config: &Config, address: &str, output: Option<&Path>) -> Result<()> {
    let client = api_client(config)?;
    let tree = client
        .fetch_tree(address)
        .await
        .with_context(|| format!("Failed to fetch wallet tree for {}", address.trim()))?;
    info!(wallets = tree.len(), "Tree downloaded");

    write_json(&tree, output)
}
