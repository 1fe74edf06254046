use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One sample from a mining device's `instanceInfo` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceMetric {
    pub timestamp: DateTime<Utc>,
    pub instance_id: String,
    pub instance_name: String,
    pub hashrate: f64,
    pub temperature: f64,
    pub power: f64,
    pub fan_speed: i64,
    pub best_diff: String,
    pub shares_accepted: i64,
    pub shares_rejected: i64,
    pub frequency: i64,
    pub voltage: f64,
    pub core_voltage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PoolMetric {
    pub timestamp: DateTime<Utc>,
    pub pool_id: String,
    pub pool_name: String,
    pub pool_hashrate: f64,
    pub pool_workers: i64,
    pub network_hashrate: f64,
    pub network_difficulty: f64,
    pub last_block_time: Option<DateTime<Utc>>,
    pub blocks_found: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NodeMetric {
    pub timestamp: DateTime<Utc>,
    pub node_id: String,
    pub node_name: String,
    pub block_height: i64,
    pub connections: i64,
    pub difficulty: f64,
    pub network_hashrate: f64,
}

// =============================================================================
// PAYLOAD EXTRACTION
// =============================================================================
//
// Remote payloads vary between firmware and software versions. Missing or
// mistyped fields fall back to zero values instead of failing the sample.

fn lookup<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(payload, |v, key| v.get(*key))
}

fn float_at(payload: &Value, path: &[&str]) -> f64 {
    lookup(payload, path).and_then(Value::as_f64).unwrap_or_default()
}

fn int_at(payload: &Value, path: &[&str]) -> i64 {
    match lookup(payload, path) {
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        None => 0,
    }
}

fn text_at(payload: &Value, path: &[&str]) -> String {
    match lookup(payload, path) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn time_at(payload: &Value, path: &[&str]) -> Option<DateTime<Utc>> {
    lookup(payload, path)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

impl DeviceMetric {
    pub fn from_payload(peer: &str, payload: &Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            instance_id: peer.to_string(),
            instance_name: peer.to_string(),
            hashrate: float_at(payload, &["hashRate"]),
            temperature: float_at(payload, &["temp"]),
            power: float_at(payload, &["power"]),
            fan_speed: int_at(payload, &["fanSpeed"]).max(int_at(payload, &["fanspeed"])),
            best_diff: text_at(payload, &["bestDiff"]),
            shares_accepted: int_at(payload, &["sharesAccepted"]),
            shares_rejected: int_at(payload, &["sharesRejected"]),
            frequency: int_at(payload, &["frequency"]),
            voltage: float_at(payload, &["voltage"]),
            core_voltage: float_at(payload, &["coreVoltage"]),
        }
    }
}

impl PoolMetric {
    /// Miningcore answers `/api/pools` with `{pools: [...]}`; each pool becomes
    /// one sample keyed `peer/poolId`. A flat payload becomes one sample keyed `peer`.
    pub fn from_payload(peer: &str, payload: &Value, timestamp: DateTime<Utc>) -> Vec<Self> {
        match payload.get("pools").and_then(Value::as_array) {
            Some(pools) => pools
                .iter()
                .map(|pool| {
                    let id = text_at(pool, &["id"]);
                    Self {
                        timestamp,
                        pool_id: if id.is_empty() { peer.to_string() } else { format!("{}/{}", peer, id) },
                        pool_name: peer.to_string(),
                        pool_hashrate: float_at(pool, &["poolStats", "poolHashrate"]),
                        pool_workers: int_at(pool, &["poolStats", "connectedMiners"]),
                        network_hashrate: float_at(pool, &["networkStats", "networkHashrate"]),
                        network_difficulty: float_at(pool, &["networkStats", "networkDifficulty"]),
                        last_block_time: time_at(pool, &["networkStats", "lastNetworkBlockTime"]),
                        blocks_found: int_at(pool, &["totalBlocks"]),
                    }
                })
                .collect(),
            None => vec![Self {
                timestamp,
                pool_id: peer.to_string(),
                pool_name: peer.to_string(),
                pool_hashrate: float_at(payload, &["poolHashrate"]),
                pool_workers: int_at(payload, &["poolWorkers"]),
                network_hashrate: float_at(payload, &["networkHashrate"]),
                network_difficulty: float_at(payload, &["networkDifficulty"]),
                last_block_time: time_at(payload, &["lastNetworkBlockTime"]),
                blocks_found: int_at(payload, &["totalBlocks"]),
            }],
        }
    }
}

impl NodeMetric {
    pub fn from_rpc(
        node_id: &str,
        node_name: &str,
        blockchain_info: &Value,
        network_info: &Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            node_id: node_id.to_string(),
            node_name: node_name.to_string(),
            block_height: int_at(blockchain_info, &["blocks"]),
            connections: int_at(network_info, &["connections"]),
            difficulty: float_at(blockchain_info, &["difficulty"]),
            network_hashrate: float_at(blockchain_info, &["networkhashps"]),
        }
    }
}
