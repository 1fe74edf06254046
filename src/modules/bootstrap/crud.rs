use rand::{distr::Alphanumeric, Rng};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

use super::schema::{BootstrapRequest, NamedUrl};
use crate::config::environment::DEFAULT_PORT;
use crate::config::settings::DEFAULT_COOKIE_MAX_AGE;
use crate::config::store::{write_atomic, ConfigError, CONFIG_FILE, JWT_KEY_FILE, RPC_CONFIG_FILE};
use crate::modules::auth::crud::{AccessCrud, AuthError};

pub const JWT_KEY_LENGTH: usize = 32;
const DEFAULT_RPC_PORT: u16 = 8332;
const DASHBOARD_VERSION: f64 = 3.0;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Failed to save configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to save access credentials: {0}")]
    Access(#[from] AuthError),

    #[error("Failed to serialize {0}: {1}")]
    Encode(&'static str, String),
}

/// Writes the setup files for a first run.
///
/// `jsonWebTokenKey.json` goes last: the gate switches modes once all
/// required files exist, so the set only becomes complete after everything
/// else is on disk.
pub struct SetupWriter {
    config_dir: PathBuf,
}

impl SetupWriter {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
        }
    }

    pub async fn write(&self, req: &BootstrapRequest) -> Result<(), SetupError> {
        let config = build_config(req);
        self.write_json(CONFIG_FILE, &config).await?;

        let access = AccessCrud::new(&self.config_dir);
        if req.enable_auth {
            access.write(Some((&req.username, &req.password))).await?;
        } else {
            access.write(None).await?;
        }

        if req.enable_crypto_node {
            self.write_json(RPC_CONFIG_FILE, &build_rpc_config(req)).await?;
        }

        let (key, expires_in) = if req.enable_auth {
            (req.jwt_key.clone(), expiry_label(&req.jwt_expiry))
        } else {
            (random_key(JWT_KEY_LENGTH), "1h")
        };
        self.write_json(
            JWT_KEY_FILE,
            &json!({ "jsonWebTokenKey": key, "expiresIn": expires_in }),
        )
        .await?;

        tracing::info!(dir = %self.config_dir.display(), auth = req.enable_auth, "Setup files written");
        Ok(())
    }

    async fn write_json(&self, name: &'static str, value: &Value) -> Result<(), SetupError> {
        let body = serde_json::to_vec_pretty(value).map_err(|e| SetupError::Encode(name, e.to_string()))?;
        write_atomic(&self.config_dir.join(name), &body).await?;
        Ok(())
    }
}

pub fn build_config(req: &BootstrapRequest) -> Value {
    let cookie_max_age = if req.enable_auth && !req.jwt_expiry.is_empty() {
        expiry_seconds(&req.jwt_expiry)
    } else {
        DEFAULT_COOKIE_MAX_AGE
    };

    let mining_core_url = if req.enable_mining_core {
        named_urls(&req.mining_core_instances)
    } else {
        Vec::new()
    };

    let crypto_nodes = if req.enable_crypto_node {
        json!([{
            "NodeType": req.crypto_node_type,
            "NodeName": req.crypto_node_name,
            "NodeId": req.crypto_node_id,
            "NodeAlgo": req.crypto_node_algo,
            "NodeDisplayFields": node_display_fields(),
        }])
    } else {
        Value::Null
    };

    json!({
        "axeos_dashboard_version": DASHBOARD_VERSION,
        "disable_authentication": !req.enable_auth,
        "cookie_max_age": cookie_max_age,
        "disable_settings": false,
        "disable_configurations": false,
        "web_server_port": parse_port(&req.port).unwrap_or(DEFAULT_PORT),
        "title": req.title,
        "axeos_instances": named_urls(&req.bitaxe_instances),
        "display_fields": device_display_fields(),
        "mining_core_enabled": req.enable_mining_core,
        "mining_core_url": mining_core_url,
        "mining_core_display_fields": pool_display_fields(),
        "cryptNodesEnabled": req.enable_crypto_node,
        "cryptoNodes": crypto_nodes,
        "configuration_outdated": false,
        "axeos_api": Value::Null,
    })
}

fn build_rpc_config(req: &BootstrapRequest) -> Value {
    let port = parse_port(&req.crypto_node_rpc_port).unwrap_or(DEFAULT_RPC_PORT);
    json!({
        "cryptoNodes": [{
            "NodeId": req.crypto_node_id,
            "NodeRPCAddress": req.crypto_node_rpc_ip,
            "NodeRPCPort": port,
            "NodeRPAuth": req.crypto_node_rpc_auth,
        }]
    })
}

fn named_urls(entries: &[NamedUrl]) -> Vec<Map<String, Value>> {
    entries
        .iter()
        .filter(|e| !e.name.trim().is_empty() && !e.url.trim().is_empty())
        .map(|e| {
            let mut entry = Map::new();
            entry.insert(e.name.trim().to_string(), Value::String(e.url.trim().to_string()));
            entry
        })
        .collect()
}

/// Unprivileged port in `1024..=65523`, or `None`. Empty input means the default.
pub fn parse_port(raw: &str) -> Option<u16> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(DEFAULT_PORT);
    }
    raw.parse::<u16>().ok().filter(|p| (1024..=65523).contains(p))
}

pub fn expiry_seconds(label: &str) -> u64 {
    match label {
        "8h" => 28_800,
        "24h" => 86_400,
        "7d" => 604_800,
        _ => DEFAULT_COOKIE_MAX_AGE,
    }
}

fn expiry_label(label: &str) -> &'static str {
    match label {
        "8h" => "8h",
        "24h" => "24h",
        "7d" => "7d",
        _ => "1h",
    }
}

fn random_key(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn field_group(title: &str, fields: &[(&str, &str)]) -> Value {
    let entries: Vec<Value> = fields.iter().map(|(key, label)| json!({ (*key): label })).collect();
    json!({ (title): entries })
}

fn device_display_fields() -> Value {
    json!([
        field_group(
            "Mining Metrics",
            &[
                ("hashRate", "Hashrate"),
                ("expectedHashrate", "Expect Hashrate"),
                ("bestDiff", "Best Difficulty"),
                ("bestSessionDiff", "Best Session Difficulty"),
                ("poolDifficulty", "Pool Difficulty"),
                ("sharesAccepted", "Shares Accepted"),
                ("sharesRejected", "Shares Rejected"),
                ("sharesRejectedReasons", "Shares Rejected Reasons"),
                ("responseTime", "Response Time"),
            ],
        ),
        field_group(
            "General Information",
            &[
                ("hostname", "Hostname"),
                ("power", "Power"),
                ("voltage", "Voltage"),
                ("coreVoltageActual", "ASIC Voltage"),
                ("frequency", "Frequency"),
                ("temp", "ASIC Temp"),
                ("vrTemp", "VR Temp"),
                ("fanspeed", "Fan Speed"),
                ("minFanSpeed", "Min Fan Speed"),
                ("fanrpm", "Fan RPM"),
                ("temptarget", "Target Temp"),
                ("overheat_mode", "Over Heat Mode"),
                ("uptimeSeconds", "Uptime"),
                ("coreVoltage", "Core Voltage"),
                ("current", "Current"),
                ("wifiRSSI", "Wifi RSSI"),
                ("stratumURL", "Stratum URL"),
                ("stratumUser", "Stratum User"),
                ("stratumPort", "Stratum Port"),
                ("isUsingFallbackStratum", "Using Fallback Stratum"),
                ("axeOSVersion", "AxeOS Version"),
                ("idfVersion", "IDF Version"),
                ("boardVersion", "Board Version"),
                ("ASICModel", "ASIC Chip"),
            ],
        ),
    ])
}

fn pool_display_fields() -> Value {
    json!([
        field_group(
            "Network Status",
            &[
                ("networkHashrate", "Network Hashrate"),
                ("networkDifficulty", "Network Difficulty"),
                ("lastNetworkBlockTime", "Last Block Time"),
                ("blockHeight", "Block Height"),
                ("connectedPeers", "Connected Peers"),
                ("nodeVersion", "Node Version"),
            ],
        ),
        field_group(
            "Miner(s) Status",
            &[("connectedMiners", "Connected Miners"), ("poolHashrate", "Pool Hashrate")],
        ),
        field_group(
            "Rewards Status",
            &[
                ("totalPaid", "Total Paid"),
                ("totalBlocks", "Total Blocks"),
                ("totalConfirmedBlocks", "Total Confirmed Blocks"),
                ("totalPendingBlocks", "Total Pending Blocks"),
                ("lastPoolBlockTime", "Last Pool Block Time"),
                ("blockReward", "Block Reward"),
            ],
        ),
    ])
}

fn node_display_fields() -> Value {
    json!([
        field_group(
            "Block Chain Info",
            &[
                ("chain", "Chain"),
                ("blocks", "Blocks"),
                ("headers", "Headers"),
                ("size_on_disk", "Size on Disk"),
                ("mediantime", "Median Time"),
                ("pruned", "Pruned"),
                ("verificationprogress", "Verification"),
                ("initialblockdownload", "Initializing"),
                ("warnings", "Warnings"),
                ("difficulties/sha256d", "Difficulty"),
            ],
        ),
        field_group(
            "Network Info",
            &[
                ("version", "Version"),
                ("subversion", "Subversion"),
                ("protocolversion", "Protocol"),
                ("networkactive", "Active"),
                ("warnings", "Warnings"),
                ("connections", "Connections"),
                ("connections_in", "In"),
                ("connections_out", "Out"),
            ],
        ),
        field_group(
            "Network Totals",
            &[
                ("target", "Target"),
                ("totalbytesrecv", "Received"),
                ("totalbytessent", "Sent"),
                ("bytes_left_in_cycle", "Bytes Left"),
                ("timemillis", "Updated"),
                ("target_reached", "Target Reached"),
                ("serve_historical_blocks", "Historicals"),
                ("timeframe", "Cycle Time"),
                ("time_left_in_cycle", "Time Left"),
            ],
        ),
        field_group("Wallet Info", &[("balance", "Balance")]),
    ])
}
