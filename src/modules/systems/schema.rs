use serde::Serialize;
use serde_json::Value;

use crate::services::aggregator::nodes::NodeData;
use crate::services::aggregator::pools::PoolInstanceData;

/// Body of `GET /api/systems/info`. Every configured peer appears exactly once,
/// failed peers included.
#[derive(Debug, Serialize)]
pub struct SystemsInfoResponse {
    #[serde(rename = "minerData")]
    pub miner_data: Vec<Value>,
    #[serde(rename = "displayFields")]
    pub display_fields: Value,
    #[serde(rename = "miningCoreData")]
    pub mining_core_data: Vec<PoolInstanceData>,
    #[serde(rename = "miningCoreDisplayFields")]
    pub mining_core_display_fields: Value,
    #[serde(rename = "cryptoNodeData")]
    pub crypto_node_data: Vec<NodeData>,
    pub disable_settings: bool,
    pub disable_configurations: bool,
    pub disable_authentication: bool,
    pub mining_core_enabled: bool,
}
