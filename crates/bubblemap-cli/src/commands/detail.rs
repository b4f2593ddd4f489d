//! Fetch balances for a single wallet.

use anyhow::{Context, Result};
use tracing::instrument;

use super::{api_client, write_json};
use crate::config::Config;

#[instrument(name = "detail", skip_all, fields(address = %address.trim()))]
pub async fn execute(config: &Config, address: &str, json: bool) -> Result<()> {
    let client = api_client(config)?;
    let detail = client
        .fetch_detail(address)
        .await
        .with_context(|| format!("Failed to fetch wallet data for {}", address.trim()))?;

    if json {
        return write_json(&detail, None);
    }

    println!("Wallet:  {}", address.trim());
    println!("Balance: {:.4} ETH", detail.native_balance);
    if detail.token_balances.is_empty() {
        println!("Tokens:  (none)");
    } else {
        println!("Tokens:");
        for token in &detail.token_balances {
            println!("  {:<10} {}", token.token_symbol, token.balance);
        }
    }
    Ok(())
}
