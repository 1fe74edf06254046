use serde::Serialize;
use serde_json::Value;

use super::fanout::{fan_out, FanOutOptions, PeerOutcome};
use crate::config::{Peer, Settings};
use crate::services::remote::RemoteClient;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolInstanceData {
    pub instance_name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub pools: Vec<Value>,
}

/// Fetch the pool list from every configured Miningcore instance.
/// Returns nothing when pool collection is disabled.
pub async fn fetch_pools(
    remote: &RemoteClient,
    settings: &Settings,
    options: FanOutOptions,
) -> Vec<PeerOutcome<Value>> {
    if !settings.mining_core_enabled {
        return Vec::new();
    }

    let path = settings.api_path("pools").to_string();
    let remote = remote.clone();

    fan_out(settings.pool_peers().to_vec(), options, move |peer: Peer| {
        let remote = remote.clone();
        let url = format!("{}{}", peer.url, path);
        async move { remote.get_json(&url).await }
    })
    .await
}

pub fn pools_of(payload: &Value) -> Vec<Value> {
    payload
        .get("pools")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

pub fn pool_entry(outcome: PeerOutcome<Value>) -> PoolInstanceData {
    match outcome.result {
        Ok(payload) => PoolInstanceData {
            instance_name: outcome.peer,
            status: "OK",
            message: None,
            pools: pools_of(&payload),
        },
        Err(failure) => PoolInstanceData {
            instance_name: outcome.peer,
            status: "Error",
            message: Some(failure.message),
            pools: Vec::new(),
        },
    }
}
