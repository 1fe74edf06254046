use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::records::{DeviceMetric, NodeMetric, PoolMetric};
use super::{effective_limit, purge_cutoff, MetricsSink, Result};

/// In-process sink. Used when no database is wanted and by tests.
#[derive(Default)]
pub struct MemorySink {
    devices: RwLock<Vec<DeviceMetric>>,
    pools: RwLock<Vec<PoolMetric>>,
    nodes: RwLock<Vec<NodeMetric>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device_count(&self) -> usize {
        self.devices.read().len()
    }

    pub fn pool_count(&self) -> usize {
        self.pools.read().len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.read().len()
    }
}

fn newest_first<T: Clone>(
    rows: &[T],
    matches: impl Fn(&T) -> bool,
    timestamp: impl Fn(&T) -> DateTime<Utc>,
    limit: u32,
) -> Vec<T> {
    let mut selected: Vec<T> = rows.iter().filter(|r| matches(r)).cloned().collect();
    selected.sort_by_key(|r| std::cmp::Reverse(timestamp(r)));
    selected.truncate(effective_limit(limit) as usize);
    selected
}

#[async_trait]
impl MetricsSink for MemorySink {
    async fn insert_device_metric(&self, metric: &DeviceMetric) -> Result<()> {
        self.devices.write().push(metric.clone());
        Ok(())
    }

    async fn insert_pool_metric(&self, metric: &PoolMetric) -> Result<()> {
        self.pools.write().push(metric.clone());
        Ok(())
    }

    async fn insert_node_metric(&self, metric: &NodeMetric) -> Result<()> {
        self.nodes.write().push(metric.clone());
        Ok(())
    }

    async fn query_device_metrics(
        &self,
        instance_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<DeviceMetric>> {
        Ok(newest_first(
            &self.devices.read(),
            |m| m.instance_id == instance_id && m.timestamp >= start && m.timestamp <= end,
            |m| m.timestamp,
            limit,
        ))
    }

    async fn query_pool_metrics(
        &self,
        pool_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<PoolMetric>> {
        Ok(newest_first(
            &self.pools.read(),
            |m| m.pool_id == pool_id && m.timestamp >= start && m.timestamp <= end,
            |m| m.timestamp,
            limit,
        ))
    }

    async fn query_node_metrics(
        &self,
        node_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<NodeMetric>> {
        Ok(newest_first(
            &self.nodes.read(),
            |m| m.node_id == node_id && m.timestamp >= start && m.timestamp <= end,
            |m| m.timestamp,
            limit,
        ))
    }

    async fn purge(&self, older_than_days: u32) -> Result<u64> {
        let Some(cutoff) = purge_cutoff(older_than_days) else {
            return Ok(0);
        };
        let mut removed = 0;

        let mut devices = self.devices.write();
        let before = devices.len();
        devices.retain(|m| m.timestamp >= cutoff);
        removed += before - devices.len();
        drop(devices);

        let mut pools = self.pools.write();
        let before = pools.len();
        pools.retain(|m| m.timestamp >= cutoff);
        removed += before - pools.len();
        drop(pools);

        let mut nodes = self.nodes.write();
        let before = nodes.len();
        nodes.retain(|m| m.timestamp >= cutoff);
        removed += before - nodes.len();

        Ok(removed as u64)
    }
}
