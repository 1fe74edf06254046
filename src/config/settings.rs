use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::environment::DEFAULT_PORT;

pub const DEFAULT_COOKIE_MAX_AGE: u64 = 3600;
pub const DEFAULT_COLLECTION_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

// =============================================================================
// PEERS
// =============================================================================

/// A named remote endpoint reachable over plain HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Peer {
    pub name: String,
    pub url: String,
}

impl Peer {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// A blockchain node as listed under `cryptoNodes`.
/// Connection details are resolved separately from `rpcConfig.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodePeer {
    pub id: String,
    pub name: String,
    pub node_type: String,
    pub algo: String,
}

impl NodePeer {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Older key names accepted in `config.json`, paired with the key they stand for.
pub const LEGACY_KEYS: [(&str, &str); 3] = [
    ("bitaxe_dashboard_version", "axeos_dashboard_version"),
    ("bitaxe_instances", "axeos_instances"),
    ("bitaxe_api", "axeos_api"),
];

/// Rename legacy keys in a raw document. The current name wins when both are present.
pub fn canonicalize_keys(raw: &mut Map<String, Value>) {
    for (legacy, current) in LEGACY_KEYS {
        if let Some(value) = raw.remove(legacy) {
            raw.entry(current).or_insert(value);
        }
    }
}

/// One immutable snapshot of `config.json`.
///
/// Unknown keys are kept in `extra` so a round trip through the store never
/// drops operator data. Display metadata is opaque and passed through as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_port", deserialize_with = "null_as_port")]
    pub web_server_port: u16,
    #[serde(default, deserialize_with = "null_as_default", alias = "bitaxe_dashboard_version")]
    pub axeos_dashboard_version: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default", alias = "bitaxe_instances")]
    pub axeos_instances: Vec<BTreeMap<String, String>>,
    #[serde(default)]
    pub display_fields: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mining_core_enabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mining_core_url: Vec<BTreeMap<String, String>>,
    #[serde(default)]
    pub mining_core_display_fields: Value,
    #[serde(rename = "cryptNodesEnabled", default, deserialize_with = "null_as_default")]
    pub crypt_nodes_enabled: bool,
    #[serde(rename = "cryptoNodes", default)]
    pub crypto_nodes: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disable_authentication: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disable_settings: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disable_configurations: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cookie_max_age: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub configuration_outdated: bool,
    #[serde(default, alias = "bitaxe_api")]
    pub axeos_api: Option<HashMap<String, String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data_collection_enabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub collection_interval_seconds: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data_retention_days: u32,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    #[serde(skip)]
    devices: Vec<Peer>,
    #[serde(skip)]
    pools: Vec<Peer>,
    #[serde(skip)]
    nodes: Vec<NodePeer>,
    #[serde(skip)]
    node_display_fields: Value,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            web_server_port: DEFAULT_PORT,
            axeos_dashboard_version: 0.0,
            title: String::new(),
            axeos_instances: Vec::new(),
            display_fields: Value::Null,
            mining_core_enabled: false,
            mining_core_url: Vec::new(),
            mining_core_display_fields: Value::Null,
            crypt_nodes_enabled: false,
            crypto_nodes: Value::Null,
            disable_authentication: false,
            disable_settings: false,
            disable_configurations: false,
            cookie_max_age: DEFAULT_COOKIE_MAX_AGE,
            configuration_outdated: false,
            axeos_api: None,
            data_collection_enabled: false,
            collection_interval_seconds: DEFAULT_COLLECTION_INTERVAL_SECS,
            data_retention_days: DEFAULT_RETENTION_DAYS,
            extra: Map::new(),
            devices: Vec::new(),
            pools: Vec::new(),
            nodes: Vec::new(),
            node_display_fields: Value::Null,
        }
    }
}

impl Settings {
    /// Parse a raw JSON document and apply defaults.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let settings: Settings = serde_json::from_value(value)?;
        Ok(settings.normalized())
    }

    /// Apply defaults and derive the peer sets. Must run before a snapshot is published.
    pub fn normalized(mut self) -> Self {
        if self.cookie_max_age == 0 {
            self.cookie_max_age = DEFAULT_COOKIE_MAX_AGE;
        }
        if self.collection_interval_seconds == 0 {
            self.collection_interval_seconds = DEFAULT_COLLECTION_INTERVAL_SECS;
        }
        if self.data_retention_days == 0 {
            self.data_retention_days = DEFAULT_RETENTION_DAYS;
        }
        if self.web_server_port == 0 {
            self.web_server_port = DEFAULT_PORT;
        }

        self.devices = flatten_peers("axeos_instances", &self.axeos_instances);
        self.pools = flatten_peers("mining_core_url", &self.mining_core_url);
        let (nodes, display_fields) = parse_crypto_nodes(&self.crypto_nodes);
        self.nodes = nodes;
        self.node_display_fields = display_fields;
        self
    }

    pub fn device_peers(&self) -> &[Peer] {
        &self.devices
    }

    pub fn pool_peers(&self) -> &[Peer] {
        &self.pools
    }

    pub fn node_peers(&self) -> &[NodePeer] {
        &self.nodes
    }

    pub fn node_display_fields(&self) -> &Value {
        &self.node_display_fields
    }

    pub fn find_device(&self, name: &str) -> Option<&Peer> {
        self.devices.iter().find(|p| p.name == name)
    }

    /// Remote path for a named device API, honouring `axeos_api` overrides.
    pub fn api_path<'a>(&'a self, key: &str) -> &'a str {
        if let Some(path) = self.axeos_api.as_ref().and_then(|m| m.get(key)) {
            if !path.is_empty() {
                return path;
            }
        }
        default_api_path(key)
    }
}

pub fn default_api_path(key: &str) -> &'static str {
    match key {
        "instanceInfo" => "/api/system/info",
        "instanceRestart" => "/api/system/restart",
        "instanceSettings" => "/api/system",
        "pools" => "/api/pools",
        "statisticsDashboard" => "/api/system/statistics/dashboard",
        _ => "",
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u16>::deserialize(deserializer)?.unwrap_or(DEFAULT_PORT))
}

/// `[{name: url}, ...]` into an ordered, name-unique list.
fn flatten_peers(collection: &str, raw: &[BTreeMap<String, String>]) -> Vec<Peer> {
    let mut seen = HashSet::new();
    let mut peers = Vec::new();

    for entry in raw {
        for (name, url) in entry {
            if name.is_empty() || url.is_empty() {
                continue;
            }
            if !seen.insert(name.clone()) {
                tracing::warn!(collection, peer = %name, "Duplicate peer name ignored");
                continue;
            }
            peers.push(Peer::new(name.clone(), url.clone()));
        }
    }

    peers
}

/// Accepts both the grouped layout `[{Nodes: [...], NodeDisplayFields}]`
/// and the flat layout `[{NodeId, NodeName, ..., NodeDisplayFields}]`.
fn parse_crypto_nodes(raw: &Value) -> (Vec<NodePeer>, Value) {
    let mut nodes = Vec::new();
    let mut display_fields = Value::Null;
    let mut seen = HashSet::new();

    let Some(items) = raw.as_array() else {
        return (nodes, display_fields);
    };

    let mut push = |entry: &Value, nodes: &mut Vec<NodePeer>| {
        let text = |key: &str| entry.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
        let node = NodePeer {
            id: text("NodeId"),
            name: text("NodeName"),
            node_type: text("NodeType"),
            algo: text("NodeAlgo"),
        };
        if node.id.is_empty() {
            return;
        }
        if !seen.insert(node.id.clone()) {
            tracing::warn!(collection = "cryptoNodes", peer = %node.id, "Duplicate node id ignored");
            return;
        }
        nodes.push(node);
    };

    for item in items {
        if let Some(grouped) = item.get("Nodes").and_then(Value::as_array) {
            for entry in grouped {
                push(entry, &mut nodes);
            }
        } else if item.get("NodeId").is_some() {
            push(item, &mut nodes);
        }

        if let Some(fields) = item.get("NodeDisplayFields") {
            display_fields = fields.clone();
        }
    }

    (nodes, display_fields)
}
