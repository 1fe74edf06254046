pub mod memory;
pub mod records;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::MemorySink;
pub use records::{DeviceMetric, NodeMetric, PoolMetric};
pub use sqlite::SqliteSink;

pub type Result<T> = std::result::Result<T, SinkError>;

pub const DEFAULT_QUERY_LIMIT: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Metrics store unavailable: {0}")]
    Open(String),

    #[error("Metrics write failed: {0}")]
    Write(String),

    #[error("Metrics query failed: {0}")]
    Query(String),
}

/// Append-only store for collected metrics.
///
/// Implementations must accept concurrent inserts. Queries return newest first;
/// a `limit` of 0 means `DEFAULT_QUERY_LIMIT`.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn insert_device_metric(&self, metric: &DeviceMetric) -> Result<()>;
    async fn insert_pool_metric(&self, metric: &PoolMetric) -> Result<()>;
    async fn insert_node_metric(&self, metric: &NodeMetric) -> Result<()>;

    async fn query_device_metrics(
        &self,
        instance_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<DeviceMetric>>;

    async fn query_pool_metrics(
        &self,
        pool_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<PoolMetric>>;

    async fn query_node_metrics(
        &self,
        node_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<NodeMetric>>;

    /// Delete records older than `older_than_days`. Returns the number removed.
    async fn purge(&self, older_than_days: u32) -> Result<u64>;
}

pub(crate) fn effective_limit(limit: u32) -> u32 {
    if limit == 0 {
        DEFAULT_QUERY_LIMIT
    } else {
        limit
    }
}

/// Oldest timestamp that survives a purge. `None` when the retention window
/// reaches past the representable range, in which case nothing is expired.
pub(crate) fn purge_cutoff(older_than_days: u32) -> Option<DateTime<Utc>> {
    chrono::Duration::try_days(i64::from(older_than_days))
        .and_then(|window| Utc::now().checked_sub_signed(window))
}
