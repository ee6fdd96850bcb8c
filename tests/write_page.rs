//! The one-shot page writer: file on success, nothing on failure.

mod common;

use std::collections::HashMap;
use std::process::Command;

use coinflow::config::Config;
use coinflow::error::DashboardError;
use coinflow::flow::Selection;
use coinflow::view;
use common::{canned, spawn};
use tempfile::TempDir;

const DUNE_PATH: &str = "/api/v1/query/42/results";

const DUNE_OK: &str = r#"{"result":{"rows":[
    {"source":"USDT","target":"BTC","value":100},
    {"source":"BTC","target":"ETH","value":30}
]}}"#;

fn config(base: &str, output: &str) -> Config {
    let mut env: HashMap<&str, String> = HashMap::new();
    env.insert("DUNE_API_KEY", "test-key".into());
    env.insert("DUNE_QUERY_ID", "42".into());
    env.insert("DUNE_BASE", base.into());
    env.insert("OUTPUT_PATH", output.into());
    Config::from_lookup(|k| env.get(k).cloned()).expect("config")
}

#[tokio::test]
async fn page_is_written_on_success() {
    let (base, _) = spawn(vec![(DUNE_PATH, canned(200, DUNE_OK))]).await;
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("flows.html");
    let cfg = config(&base, out.to_str().unwrap());

    let path = view::write_page(&cfg, &Selection::default()).await.unwrap();
    assert_eq!(path, out);
    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("\"type\":\"sankey\""));
    assert!(html.contains("<option value=\"USDT\">USDT</option>"));
}

#[tokio::test]
async fn upstream_500_writes_nothing() {
    let (base, _) = spawn(vec![(DUNE_PATH, canned(500, "{}"))]).await;
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("flows.html");
    let cfg = config(&base, out.to_str().unwrap());

    let err = view::write_page(&cfg, &Selection::default()).await.unwrap_err();
    assert!(matches!(err, DashboardError::Upstream { provider: "dune", status: 500 }));
    assert!(!out.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn binary_exits_nonzero_and_writes_nothing_on_upstream_500() {
    let (base, _) = spawn(vec![(DUNE_PATH, canned(500, "{}"))]).await;
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("flows.html");

    let child_out = out.clone();
    let status = tokio::task::spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_coinflow"))
            .env("FLOW_SOURCE", "dune")
            .env("DUNE_API_KEY", "test-key")
            .env("DUNE_QUERY_ID", "42")
            .env("DUNE_BASE", &base)
            .env("OUTPUT_PATH", &child_out)
            .env_remove("FLOW_FALLBACK")
            .env_remove("LOG_DIR")
            .output()
    })
    .await
    .unwrap()
    .unwrap()
    .status;

    assert_eq!(status.code(), Some(1));
    assert!(!out.exists());
}
