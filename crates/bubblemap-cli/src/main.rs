//! Bubblemap CLI - fetch wallet trees and render bubble map frames headlessly.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{config as config_cmd, render::RenderOptions};
use config::Config;

/// Bubblemap CLI - Explore wallet relationships as a bubble map.
///
/// Trees come from the wallet server (`bm fetch`) or from JSON files.
/// `bm render` lays the tree out and prints the frame a drawing surface
/// would paint.
#[derive(Parser, Debug)]
#[command(
    name = "bm",
    author,
    version,
    about = "Bubblemap: wallet relationship bubble maps",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the wallet tree rooted at an address.
    Fetch {
        /// Seed wallet address.
        address: String,

        /// Write the tree to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Lay out a wallet tree and print the render frame as JSON.
    Render {
        /// Wallet tree JSON file.
        #[arg(long)]
        tree: PathBuf,

        /// Wallet analytics JSON file (array of entries).
        #[arg(long)]
        analytics: Option<PathBuf>,

        /// Node id to select instead of the main wallet.
        #[arg(long)]
        select: Option<String>,

        /// Node ids to hide. Repeatable.
        #[arg(long)]
        hide: Vec<String>,

        /// Maximum layout ticks (defaults to the configured limit).
        #[arg(long)]
        ticks: Option<u32>,

        /// Fetch the selected wallet's balances from the server.
        #[arg(long)]
        fetch_detail: bool,

        /// Reference time for edge recency (RFC 3339, defaults to now).
        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Write the frame to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the main wallet's counterparties, richest first.
    Wallets {
        /// Wallet tree JSON file.
        #[arg(long)]
        tree: PathBuf,

        /// Case-insensitive address filter.
        #[arg(short, long, default_value = "")]
        search: String,

        /// Node ids to mark hidden. Repeatable.
        #[arg(long)]
        hide: Vec<String>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Fetch native and token balances for one wallet.
    Detail {
        /// Wallet address.
        address: String,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration.
    Show,

    /// Set a configuration value.
    Set {
        /// Configuration key.
        key: String,
        /// Configuration value.
        value: String,
    },

    /// Get a configuration value.
    Get {
        /// Configuration key.
        key: String,
    },

    /// Reset configuration to defaults.
    Reset,

    /// Show path to config file.
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    let level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    // RUST_LOG wins over the flags when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;

    match cli.command {
        Commands::Fetch { address, output } => {
            commands::fetch::execute(&config, &address, output.as_deref()).await?;
        }

        Commands::Render {
            tree,
            analytics,
            select,
            hide,
            ticks,
            fetch_detail,
            now,
            output,
        } => {
            let options = RenderOptions {
                tree,
                analytics,
                select,
                hide,
                ticks,
                fetch_detail,
                now,
                output,
            };
            commands::render::execute(&config, options).await?;
        }

        Commands::Wallets {
            tree,
            search,
            hide,
            json,
        } => {
            commands::wallets::execute(&tree, &search, &hide, json)?;
        }

        Commands::Detail { address, json } => {
            commands::detail::execute(&config, &address, json).await?;
        }

        Commands::Config(config_cmd_inner) => {
            match config_cmd_inner {
                ConfigCommands::Show => config_cmd::show(&config)?,
                ConfigCommands::Set { key, value } => {
                    // File values only; env overrides stay out of config.json
                    let mut stored = Config::load_file()?;
                    config_cmd::set(&mut stored, &key, &value)?;
                }
                ConfigCommands::Get { key } => config_cmd::get(&config, &key)?,
                ConfigCommands::Reset => config_cmd::reset()?,
                ConfigCommands::Path => config_cmd::path(),
            }
        }
    }

    Ok(())
}
