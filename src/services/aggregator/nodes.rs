use serde::Serialize;
use serde_json::{json, Value};

use super::fanout::{fan_out, FanOutOptions, PeerFailure, PeerOutcome};
use crate::config::{NodePeer, RpcDirectory, RpcEndpoint, Settings};
use crate::services::remote::{RemoteClient, RemoteError};

/// Raw results of the four status calls made against one node.
#[derive(Debug, Clone)]
pub struct NodeSnapshot {
    pub blockchain_info: Value,
    pub network_totals: Value,
    pub balance: Value,
    pub network_info: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub id: String,
    pub node_id: String,
    pub node_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub node_algo: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockchain_info: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_totals: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_info: Option<Value>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub display_fields: Value,
}

pub fn endpoint_for<'a>(directory: &'a RpcDirectory, node_id: &str) -> Result<&'a RpcEndpoint, PeerFailure> {
    directory
        .get(node_id)
        .ok_or_else(|| PeerFailure::new("config", format!("no RPC configuration for node {}", node_id)))
}

/// Collapse concurrent RPC results for one node. A single failure fails the
/// node; the failure kind is the first error's and every message is joined with "; ".
pub fn all_or_nothing<const N: usize>(results: [Result<Value, RemoteError>; N]) -> Result<[Value; N], PeerFailure> {
    let errors: Vec<&RemoteError> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    if let Some(first) = errors.first() {
        let message = errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
        return Err(PeerFailure::new(first.kind(), message));
    }
    Ok(results.map(Result::unwrap_or_default))
}

/// Query one node. All four calls run concurrently and the node only counts
/// as online when every one of them succeeds.
pub async fn fetch_node(
    remote: &RemoteClient,
    directory: &RpcDirectory,
    node_id: &str,
) -> Result<NodeSnapshot, PeerFailure> {
    let endpoint = endpoint_for(directory, node_id)?;

    let (blockchain_info, network_totals, balance, network_info) = tokio::join!(
        remote.rpc_call(endpoint, "getblockchaininfo", json!([])),
        remote.rpc_call(endpoint, "getnettotals", json!([])),
        remote.rpc_call(endpoint, "getbalance", json!([])),
        remote.rpc_call(endpoint, "getnetworkinfo", json!([])),
    );

    let [blockchain_info, network_totals, balance, network_info] =
        all_or_nothing([blockchain_info, network_totals, balance, network_info])?;

    Ok(NodeSnapshot {
        blockchain_info,
        network_totals,
        balance,
        network_info,
    })
}

/// Block height and difficulty from `getblockchaininfo`, peer count from `getnetworkinfo`.
pub async fn fetch_node_status(
    remote: &RemoteClient,
    directory: &RpcDirectory,
    node_id: &str,
) -> Result<(Value, Value), PeerFailure> {
    let endpoint = endpoint_for(directory, node_id)?;

    let (blockchain_info, network_info) = tokio::join!(
        remote.rpc_call(endpoint, "getblockchaininfo", json!([])),
        remote.rpc_call(endpoint, "getnetworkinfo", json!([])),
    );

    let [blockchain_info, network_info] = all_or_nothing([blockchain_info, network_info])?;
    Ok((blockchain_info, network_info))
}

/// Fetch every node listed in `cryptoNodes`. Empty when node collection is disabled.
pub async fn fetch_nodes(
    remote: &RemoteClient,
    settings: &Settings,
    directory: RpcDirectory,
    options: FanOutOptions,
) -> Vec<PeerOutcome<NodeSnapshot>> {
    if !settings.crypt_nodes_enabled {
        return Vec::new();
    }

    let remote = remote.clone();
    let directory = std::sync::Arc::new(directory);

    fan_out(settings.node_peers().to_vec(), options, move |node: NodePeer| {
        let remote = remote.clone();
        let directory = directory.clone();
        async move { fetch_node(&remote, &directory, &node.id).await }
    })
    .await
}

pub fn node_entry(settings: &Settings, outcome: PeerOutcome<NodeSnapshot>) -> NodeData {
    let node = settings.node_peers().iter().find(|n| n.id == outcome.peer);
    let (name, node_type, algo) = match node {
        Some(n) => (n.display_name().to_string(), n.node_type.clone(), n.algo.clone()),
        None => (outcome.peer.clone(), String::new(), String::new()),
    };

    match outcome.result {
        Ok(snapshot) => NodeData {
            id: name,
            node_id: outcome.peer,
            node_type,
            node_algo: algo,
            status: "online",
            message: None,
            blockchain_info: Some(snapshot.blockchain_info),
            network_totals: Some(snapshot.network_totals),
            balance: Some(snapshot.balance),
            network_info: Some(snapshot.network_info),
            display_fields: settings.node_display_fields().clone(),
        },
        Err(failure) => NodeData {
            id: name,
            node_id: outcome.peer,
            node_type,
            node_algo: String::new(),
            status: "Error",
            message: Some(failure.message),
            blockchain_info: None,
            network_totals: None,
            balance: None,
            network_info: None,
            display_fields: Value::Null,
        },
    }
}
