//! Integration tests for the bm CLI.
//!
//! Every command runs inside a temporary directory with its own config
//! directory, so user configuration and `.env` files never leak in.
//!
//! Run with: `cargo test --package bubblemap-cli --test cli_integration`

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::TempDir;

/// Helper to run bm in a specific directory with an isolated config.
fn run_bm_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bm"))
        .current_dir(dir)
        .env("BUBBLEMAP_CONFIG_DIR", dir.join("config"))
        .env_remove("BUBBLEMAP_SERVER_URL")
        .env_remove("BUBBLEMAP_TIMEOUT_SECS")
        .env_remove("BUBBLEMAP_MAX_TICKS")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute bm command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn write_fixture(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

/// Root with three counterparties, one of them unnamed, one with a child.
fn create_tree(dir: &Path) -> PathBuf {
    write_fixture(
        dir,
        "tree.json",
        &json!({
            "address": "0xROOT",
            "balance": 12.5,
            "nodes": [
                { "address": "0xaaaa1111bbbb2222", "balance": "1.25" },
                {
                    "address": "0xCCCC3333dddd4444",
                    "balance": 7,
                    "nodes": [{ "address": "0xdeep", "balance": 3 }]
                },
                { "balance": 2 }
            ]
        }),
    )
}

fn node<'a>(frame: &'a Value, id: &str) -> &'a Value {
    frame["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"] == id)
        .unwrap_or_else(|| panic!("node {id} missing"))
}

fn edge<'a>(frame: &'a Value, source: &str, target: &str) -> &'a Value {
    frame["edges"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["source"] == source && e["target"] == target)
        .unwrap_or_else(|| panic!("edge {source}->{target} missing"))
}

// =============================================================================
// Render Command Tests
// =============================================================================

#[test]
fn test_render_prints_settled_frame() {
    let temp = TempDir::new().unwrap();
    let tree = create_tree(temp.path());

    let output = run_bm_in_dir(temp.path(), &["render", "--tree", tree.to_str().unwrap()]);
    assert!(output.status.success(), "bm render failed: {}", stderr(&output));

    let frame = stdout_json(&output);
    assert_eq!(frame["nodes"].as_array().unwrap().len(), 5);
    assert_eq!(frame["edges"].as_array().unwrap().len(), 4);
    assert_eq!(frame["settled"], true);
    assert_eq!(frame["selected"], "0xROOT");
    assert_eq!(frame["detail"]["state"], "idle");

    let root = node(&frame, "0xROOT");
    assert_eq!(root["is_main_wallet"], true);
    assert_eq!(root["radius"], 20.0);
    assert_eq!(root["stroke_width"], 4.0);
    assert_eq!(root["fill"], "#FF5733");
    assert_eq!(root["markers"], json!(["target", "check"]));

    for n in frame["nodes"].as_array().unwrap() {
        assert!(n["x"].as_f64().unwrap().is_finite());
        assert!(n["y"].as_f64().unwrap().is_finite());
    }
}

#[test]
fn test_render_hide_and_select() {
    let temp = TempDir::new().unwrap();
    let tree = create_tree(temp.path());

    let output = run_bm_in_dir(
        temp.path(),
        &[
            "render",
            "--tree",
            tree.to_str().unwrap(),
            "--select",
            "0xCCCC3333dddd4444",
            "--hide",
            "0xaaaa1111bbbb2222",
            "--ticks",
            "20",
        ],
    );
    assert!(output.status.success(), "bm render failed: {}", stderr(&output));

    let frame = stdout_json(&output);
    assert_eq!(frame["selected"], "0xCCCC3333dddd4444");
    assert_eq!(frame["settled"], false);

    let selected = node(&frame, "0xCCCC3333dddd4444");
    assert_eq!(selected["selected"], true);
    assert_eq!(selected["markers"], json!(["check"]));
    assert_eq!(node(&frame, "0xROOT")["markers"], json!(["target"]));
    assert_eq!(node(&frame, "0xROOT")["radius"], 30.0);
    assert_eq!(selected["radius"], 20.0);

    assert_eq!(node(&frame, "0xaaaa1111bbbb2222")["visible"], false);
    assert_eq!(edge(&frame, "0xROOT", "0xaaaa1111bbbb2222")["visible"], false);
    assert_eq!(edge(&frame, "0xROOT", "0xCCCC3333dddd4444")["visible"], true);
}

#[test]
fn test_render_with_analytics() {
    let temp = TempDir::new().unwrap();
    let tree = create_tree(temp.path());
    let analytics = write_fixture(
        temp.path(),
        "analytics.json",
        &json!([{
            "address": "0xCCCC3333dddd4444",
            "category": "Wallet",
            "profitability": -4,
            "txs": [{
                "from": "0xROOT", "to": "0xCCCC3333dddd4444", "value": "1.5",
                "metadata": { "blockTimestamp": "2024-05-01T00:00:00Z" }
            }]
        }]),
    );

    let output = run_bm_in_dir(
        temp.path(),
        &[
            "render",
            "--tree",
            tree.to_str().unwrap(),
            "--analytics",
            analytics.to_str().unwrap(),
            "--now",
            "2024-05-01T00:00:00Z",
        ],
    );
    assert!(output.status.success(), "bm render failed: {}", stderr(&output));

    let frame = stdout_json(&output);
    assert_eq!(node(&frame, "0xCCCC3333dddd4444")["fill"], "#67000D");
    assert_eq!(node(&frame, "0xaaaa1111bbbb2222")["fill"], "#9E9E9E");

    let growth = edge(&frame, "0xROOT", "0xCCCC3333dddd4444");
    assert_eq!(growth["color"], "#4CAF50");
    assert_eq!(growth["width"], 7.0);
}

#[test]
fn test_render_writes_output_file() {
    let temp = TempDir::new().unwrap();
    let tree = create_tree(temp.path());
    let out = temp.path().join("frame.json");

    let output = run_bm_in_dir(
        temp.path(),
        &[
            "render",
            "--tree",
            tree.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "bm render -o failed: {}", stderr(&output));
    assert!(stdout(&output).trim().is_empty());

    let frame: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(frame["nodes"].as_array().unwrap().len(), 5);
}

#[test]
fn test_render_unknown_wallet_fails() {
    let temp = TempDir::new().unwrap();
    let tree = create_tree(temp.path());

    let output = run_bm_in_dir(
        temp.path(),
        &["render", "--tree", tree.to_str().unwrap(), "--select", "0xnope"],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown wallet: 0xnope"));

    let output = run_bm_in_dir(
        temp.path(),
        &["render", "--tree", tree.to_str().unwrap(), "--hide", "0xnope"],
    );
    assert!(!output.status.success());
}

#[test]
fn test_render_missing_tree_fails() {
    let temp = TempDir::new().unwrap();
    let output = run_bm_in_dir(temp.path(), &["render", "--tree", "missing.json"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to read"));
}

// =============================================================================
// Wallets Command Tests
// =============================================================================

#[test]
fn test_wallets_sorted_by_balance() {
    let temp = TempDir::new().unwrap();
    let tree = create_tree(temp.path());

    let output = run_bm_in_dir(
        temp.path(),
        &["wallets", "--tree", tree.to_str().unwrap(), "--json"],
    );
    assert!(output.status.success(), "bm wallets failed: {}", stderr(&output));

    let rows = stdout_json(&output);
    let rows = rows.as_array().unwrap();
    let balances: Vec<f64> = rows.iter().map(|r| r["balance"].as_f64().unwrap()).collect();
    assert_eq!(balances, vec![7.0, 2.0, 1.25]);
    assert_eq!(rows[0]["rank"], 1);
    assert_eq!(rows[0]["short_address"], "0xCCCC...4444");
    assert_eq!(rows[1]["short_address"], "Unnamed Wallet");
    assert_eq!(rows[2]["balance_label"], "1.2500 ETH");
}

#[test]
fn test_wallets_search_and_hidden() {
    let temp = TempDir::new().unwrap();
    let tree = create_tree(temp.path());

    let output = run_bm_in_dir(
        temp.path(),
        &[
            "wallets",
            "--tree",
            tree.to_str().unwrap(),
            "--search",
            "AAAA",
            "--hide",
            "0xaaaa1111bbbb2222",
        ],
    );
    assert!(output.status.success(), "bm wallets failed: {}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("0xaaaa...2222"));
    assert!(text.contains("(hidden)"));
    assert!(!text.contains("0xCCCC"));
}

// =============================================================================
// Network Command Tests
// =============================================================================

#[test]
fn test_blank_address_rejected_without_request() {
    let temp = TempDir::new().unwrap();

    let output = run_bm_in_dir(temp.path(), &["detail", "  "]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Please enter a valid wallet address."));

    let output = run_bm_in_dir(temp.path(), &["fetch", ""]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Please enter a valid wallet address."));
}

// =============================================================================
// Config Command Tests
// =============================================================================

#[test]
fn test_config_set_get_reset() {
    let temp = TempDir::new().unwrap();

    let output = run_bm_in_dir(temp.path(), &["config", "get", "server-url"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "http://localhost:5000");

    let output = run_bm_in_dir(
        temp.path(),
        &["config", "set", "server-url", "https://wallets.example/"],
    );
    assert!(output.status.success(), "config set failed: {}", stderr(&output));
    assert!(temp.path().join("config/config.json").exists());

    let output = run_bm_in_dir(temp.path(), &["config", "get", "server-url"]);
    assert_eq!(stdout(&output).trim(), "https://wallets.example");

    let output = run_bm_in_dir(temp.path(), &["config", "reset"]);
    assert!(output.status.success());
    let output = run_bm_in_dir(temp.path(), &["config", "get", "server-url"]);
    assert_eq!(stdout(&output).trim(), "http://localhost:5000");
}

#[test]
fn test_env_overrides_config_file() {
    let temp = TempDir::new().unwrap();
    run_bm_in_dir(temp.path(), &["config", "set", "max-ticks", "50"]);

    let output = Command::new(env!("CARGO_BIN_EXE_bm"))
        .current_dir(temp.path())
        .env("BUBBLEMAP_CONFIG_DIR", temp.path().join("config"))
        .env("BUBBLEMAP_MAX_TICKS", "75")
        .args(["config", "get", "max-ticks"])
        .output()
        .unwrap();
    assert_eq!(stdout(&output).trim(), "75");

    let output = run_bm_in_dir(temp.path(), &["config", "get", "max-ticks"]);
    assert_eq!(stdout(&output).trim(), "50");
}

#[test]
fn test_config_set_does_not_persist_env_overrides() {
    let temp = TempDir::new().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_bm"))
        .current_dir(temp.path())
        .env("BUBBLEMAP_CONFIG_DIR", temp.path().join("config"))
        .env("BUBBLEMAP_SERVER_URL", "http://from-env.example")
        .env("BUBBLEMAP_TIMEOUT_SECS", "3")
        .args(["config", "set", "max-ticks", "5"])
        .output()
        .unwrap();
    assert!(output.status.success(), "config set failed: {}", stderr(&output));

    let saved: Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("config/config.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(saved["server_url"], "http://localhost:5000");
    assert_eq!(saved["timeout_secs"], 30);
    assert_eq!(saved["max_ticks"], 5);

    let output = run_bm_in_dir(temp.path(), &["config", "get", "server-url"]);
    assert_eq!(stdout(&output).trim(), "http://localhost:5000");
    let output = run_bm_in_dir(temp.path(), &["config", "get", "max-ticks"]);
    assert_eq!(stdout(&output).trim(), "5");
}

#[test]
fn test_config_rejects_unknown_key_and_bad_url() {
    let temp = TempDir::new().unwrap();

    let output = run_bm_in_dir(temp.path(), &["config", "set", "colour", "red"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown config key"));

    let output = run_bm_in_dir(temp.path(), &["config", "set", "server-url", "localhost"]);
    assert!(!output.status.success());
    assert!(!temp.path().join("config/config.json").exists());
}

#[test]
fn test_config_path_uses_override() {
    let temp = TempDir::new().unwrap();
    let output = run_bm_in_dir(temp.path(), &["config", "path"]);
    assert!(output.status.success());
    assert!(stdout(&output).trim().ends_with("config.json"));
    assert!(stdout(&output).contains("config"));
}
