//! Wallet list for the side panel.

use std::path::Path;

use anyhow::Result;
use tracing::instrument;

use super::render::build_session;
use super::write_json;

#[instrument(name = "wallets", skip_all, fields(tree = %tree.display()))]
pub fn execute(tree: &Path, search: &str, hide: &[String], json: bool) -> Result<()> {
    let (session, _) = build_session(tree, None, hide)?;
    let rows = session.wallet_list(search);

    if json {
        return write_json(&rows, None);
    }

    if rows.is_empty() {
        println!("No wallets found");
        return Ok(());
    }
    for row in &rows {
        println!(
            "#{:<3} {:<16} {:>16}{}",
            row.rank,
            row.short_address,
            row.balance_label,
            if row.visible { "" } else { "  (hidden)" }
        );
    }
    Ok(())
}
