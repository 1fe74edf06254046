use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::store::{ConfigError, RPC_CONFIG_FILE};

/// Connection details for one blockchain node, stored in `rpcConfig.json`.
///
/// Both key styles seen in deployed files are accepted
/// (`NodeId`/`NodeRPCAddress`/... and `id`/`rpcIp`/...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcEndpoint {
    #[serde(rename = "NodeId", alias = "id")]
    pub node_id: String,
    #[serde(rename = "NodeRPCAddress", alias = "rpcIp")]
    pub address: String,
    #[serde(rename = "NodeRPCPort", alias = "rpcPort")]
    pub port: u16,
    /// `user:password`
    #[serde(rename = "NodeRPAuth", alias = "rpcAuth", default)]
    pub auth: String,
}

impl RpcEndpoint {
    pub fn url(&self) -> String {
        if self.address.starts_with("http://") || self.address.starts_with("https://") {
            format!("{}:{}", self.address.trim_end_matches('/'), self.port)
        } else {
            format!("http://{}:{}", self.address, self.port)
        }
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.auth.is_empty() {
            return None;
        }
        Some(self.auth.split_once(':').unwrap_or((self.auth.as_str(), "")))
    }
}

#[derive(Debug, Default, Deserialize)]
struct RpcConfigFile {
    #[serde(rename = "cryptoNodes", default)]
    crypto_nodes: Vec<RpcEndpoint>,
}

/// Node id to endpoint, as read from disk. Never serialized into API responses.
#[derive(Debug, Clone, Default)]
pub struct RpcDirectory {
    endpoints: HashMap<String, RpcEndpoint>,
}

impl RpcDirectory {
    /// Read `rpcConfig.json`. A missing file yields an empty directory.
    pub async fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(RPC_CONFIG_FILE);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(format!("{}: {}", path.display(), e))),
        };

        let file: RpcConfigFile = serde_json::from_slice(&bytes)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;

        Ok(Self::from_endpoints(file.crypto_nodes))
    }

    pub fn from_endpoints(endpoints: impl IntoIterator<Item = RpcEndpoint>) -> Self {
        Self {
            endpoints: endpoints
                .into_iter()
                .map(|e| (e.node_id.clone(), e))
                .collect(),
        }
    }

    pub fn get(&self, node_id: &str) -> Option<&RpcEndpoint> {
        self.endpoints.get(node_id)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
