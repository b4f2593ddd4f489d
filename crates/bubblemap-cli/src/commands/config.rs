//! Config command implementation.

use anyhow::Result;

use crate::config::Config;

const VALID_KEYS: &str = "server-url, timeout-secs, max-ticks";

/// Show current configuration.
pub fn show(config: &Config) -> Result<()> {
    println!("Bubblemap CLI Configuration");
    println!("{:-<40}", "");
    println!("Server URL:      {}", config.server_url);
    println!("Request Timeout: {} s", config.timeout_secs);
    println!("Max Ticks:       {}", config.max_ticks);

    if let Some(config_path) = Config::config_file_path() {
        println!("\nConfig file: {}", config_path.display());
    }

    Ok(())
}

/// Set a configuration value.
pub fn set(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "server-url" | "server" | "url" => {
            let url = value.trim().trim_end_matches('/');
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("Server URL must start with http:// or https://: {}", value);
            }
            config.server_url = url.to_string();
        }
        "timeout-secs" | "timeout" => {
            config.timeout_secs = value.parse()?;
        }
        "max-ticks" | "ticks" => {
            config.max_ticks = value.parse()?;
        }
        _ => {
            anyhow::bail!("Unknown config key: {}. Valid keys: {}", key, VALID_KEYS);
        }
    }

    config.save()?;
    println!("Set {} to: {}", key, value);
    Ok(())
}

/// Get a configuration value.
pub fn get(config: &Config, key: &str) -> Result<()> {
    let value = match key {
        "server-url" | "server" | "url" => config.server_url.clone(),
        "timeout-secs" | "timeout" => config.timeout_secs.to_string(),
        "max-ticks" | "ticks" => config.max_ticks.to_string(),
        _ => {
            anyhow::bail!("Unknown config key: {}. Valid keys: {}", key, VALID_KEYS);
        }
    };

    println!("{}", value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn reset() -> Result<()> {
    Config::default().save()?;
    println!("Configuration reset to defaults");
    Ok(())
}

pub fn path() {
    match Config::config_file_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("(no config file path available)"),
    }
}
