use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::sink::{DeviceMetric, NodeMetric, PoolMetric};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Device,
    Pool,
    Node,
}

/// `start` and `end` are RFC 3339. Without `start` the last 24 hours are returned.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub kind: MetricKind,
    pub id: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit: u32,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum HistoryRecords {
    Device(Vec<DeviceMetric>),
    Pool(Vec<PoolMetric>),
    Node(Vec<NodeMetric>),
}

impl HistoryRecords {
    pub fn len(&self) -> usize {
        match self {
            Self::Device(v) => v.len(),
            Self::Pool(v) => v.len(),
            Self::Node(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub status: &'static str,
    pub count: usize,
    pub data: HistoryRecords,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeResponse {
    pub status: &'static str,
    pub removed: u64,
    pub retention_days: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStatusResponse {
    pub enabled: bool,
    pub running: bool,
    pub tasks: Vec<&'static str>,
    pub interval_seconds: u64,
    pub retention_days: u32,
}
