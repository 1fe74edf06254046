use rig_dashboard::config::{RpcDirectory, Settings};
use rig_dashboard::services::aggregator::nodes::{fetch_node, fetch_nodes, node_entry};
use rig_dashboard::services::aggregator::FanOutOptions;
use rig_dashboard::services::remote::{RemoteClient, RemoteError};
use serde_json::json;
use std::time::Duration;

use crate::common::{crypto_nodes, rpc_endpoint, rpc_node, spawn_peer, RPC_AUTH};

fn node_settings() -> Settings {
    Settings::from_value(json!({
        "title": "Test Rigs",
        "cryptNodesEnabled": true,
        "cryptoNodes": crypto_nodes("dgb", "DigiByte")
    }))
    .unwrap()
}

#[tokio::test]
async fn rpc_call_sends_credentials_and_returns_result() {
    let url = spawn_peer(rpc_node(&[])).await;
    let endpoint = rpc_endpoint("dgb", &url, RPC_AUTH);
    let remote = RemoteClient::new(Duration::from_secs(2));

    let balance = remote.rpc_call(&endpoint, "getbalance", json!([])).await.unwrap();
    assert_eq!(balance, json!(12.5));

    let err = remote.rpc_call(&endpoint, "getmininginfo", json!([])).await.unwrap_err();
    assert!(matches!(err, RemoteError::Rpc { code: -32601, .. }));
}

#[tokio::test]
async fn wrong_credentials_are_reported_as_empty_response() {
    let url = spawn_peer(rpc_node(&[])).await;
    let endpoint = rpc_endpoint("dgb", &url, "rpcuser:wrong");
    let remote = RemoteClient::new(Duration::from_secs(2));

    let err = remote.rpc_call(&endpoint, "getbalance", json!([])).await.unwrap_err();
    assert_eq!(err.kind(), "bad_payload");
    assert!(err.to_string().contains("HTTP 401"));
    assert!(err.to_string().contains("check rpc credentials"));
}

#[tokio::test]
async fn healthy_node_reports_online() {
    let url = spawn_peer(rpc_node(&[])).await;
    let directory = RpcDirectory::from_endpoints([rpc_endpoint("dgb", &url, RPC_AUTH)]);
    let settings = node_settings();
    let remote = RemoteClient::new(Duration::from_secs(2));

    let outcomes = fetch_nodes(&remote, &settings, directory, FanOutOptions::default()).await;
    assert_eq!(outcomes.len(), 1);

    let entry = node_entry(&settings, outcomes.into_iter().next().unwrap());
    assert_eq!(entry.status, "online");
    assert_eq!(entry.id, "DigiByte");
    assert_eq!(entry.node_id, "dgb");
    assert_eq!(entry.node_algo, "sha256d");
    assert!(entry.message.is_none());
    assert_eq!(entry.blockchain_info.unwrap()["blocks"], 812345);
    assert_eq!(entry.balance, Some(json!(12.5)));
    assert_eq!(entry.network_info.unwrap()["connections"], 8);
    assert!(entry.display_fields.is_array());
}

#[tokio::test]
async fn one_failing_call_fails_the_whole_node() {
    let url = spawn_peer(rpc_node(&["getnettotals", "getbalance"])).await;
    let directory = RpcDirectory::from_endpoints([rpc_endpoint("dgb", &url, RPC_AUTH)]);
    let remote = RemoteClient::new(Duration::from_secs(2));

    let failure = fetch_node(&remote, &directory, "dgb").await.unwrap_err();
    assert_eq!(failure.kind, "rpc");
    assert_eq!(
        failure.message,
        "RPC error -1: \"getnettotals\" failed; RPC error -1: \"getbalance\" failed"
    );

    let settings = node_settings();
    let outcomes = fetch_nodes(&remote, &settings, directory, FanOutOptions::default()).await;
    let entry = node_entry(&settings, outcomes.into_iter().next().unwrap());
    assert_eq!(entry.status, "Error");
    assert_eq!(entry.message.as_deref(), Some(failure.message.as_str()));
    assert!(entry.blockchain_info.is_none());
    assert!(entry.network_info.is_none());
}

#[tokio::test]
async fn node_without_rpc_entry_is_a_config_error() {
    let settings = node_settings();
    let remote = RemoteClient::new(Duration::from_secs(1));

    let outcomes = fetch_nodes(&remote, &settings, RpcDirectory::default(), FanOutOptions::default()).await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].result.as_ref().unwrap_err().kind, "config");
}

#[tokio::test]
async fn disabled_nodes_are_not_queried() {
    let mut settings = node_settings();
    settings.crypt_nodes_enabled = false;
    let remote = RemoteClient::new(Duration::from_secs(1));

    let outcomes = fetch_nodes(&remote, &settings, RpcDirectory::default(), FanOutOptions::default()).await;
    assert!(outcomes.is_empty());
}
