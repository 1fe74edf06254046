use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::records::{DeviceMetric, NodeMetric, PoolMetric};
use super::{effective_limit, purge_cutoff, MetricsSink, Result, SinkError};
use crate::config::DbPool;

const SCHEMA: [&str; 9] = [
    "CREATE TABLE IF NOT EXISTS axeos_metrics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp DATETIME NOT NULL,
        instance_id TEXT NOT NULL,
        instance_name TEXT NOT NULL,
        hashrate REAL NOT NULL DEFAULT 0,
        temperature REAL NOT NULL DEFAULT 0,
        power REAL NOT NULL DEFAULT 0,
        fan_speed INTEGER NOT NULL DEFAULT 0,
        best_diff TEXT NOT NULL DEFAULT '',
        shares_accepted INTEGER NOT NULL DEFAULT 0,
        shares_rejected INTEGER NOT NULL DEFAULT 0,
        frequency INTEGER NOT NULL DEFAULT 0,
        voltage REAL NOT NULL DEFAULT 0,
        core_voltage REAL NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_axeos_timestamp ON axeos_metrics(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_axeos_instance ON axeos_metrics(instance_id)",
    "CREATE TABLE IF NOT EXISTS pool_metrics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp DATETIME NOT NULL,
        pool_id TEXT NOT NULL,
        pool_name TEXT NOT NULL,
        pool_hashrate REAL NOT NULL DEFAULT 0,
        pool_workers INTEGER NOT NULL DEFAULT 0,
        network_hashrate REAL NOT NULL DEFAULT 0,
        network_difficulty REAL NOT NULL DEFAULT 0,
        last_block_time DATETIME,
        blocks_found INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_pool_timestamp ON pool_metrics(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_pool_id ON pool_metrics(pool_id)",
    "CREATE TABLE IF NOT EXISTS node_metrics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp DATETIME NOT NULL,
        node_id TEXT NOT NULL,
        node_name TEXT NOT NULL,
        block_height INTEGER NOT NULL DEFAULT 0,
        connections INTEGER NOT NULL DEFAULT 0,
        difficulty REAL NOT NULL DEFAULT 0,
        network_hashrate REAL NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_node_timestamp ON node_metrics(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_node_id ON node_metrics(node_id)",
];

/// SQLite-backed metrics store.
pub struct SqliteSink {
    db: DbPool,
}

impl SqliteSink {
    /// Wrap `db` and create the tables if they are missing.
    pub async fn new(db: DbPool) -> Result<Self> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&db)
                .await
                .map_err(|e| SinkError::Open(e.to_string()))?;
        }
        Ok(Self { db })
    }

    pub fn pool(&self) -> &DbPool {
        &self.db
    }
}

#[async_trait]
impl MetricsSink for SqliteSink {
    async fn insert_device_metric(&self, m: &DeviceMetric) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO axeos_metrics (
                timestamp, instance_id, instance_name, hashrate, temperature, power,
                fan_speed, best_diff, shares_accepted, shares_rejected, frequency,
                voltage, core_voltage
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(m.timestamp)
        .bind(&m.instance_id)
        .bind(&m.instance_name)
        .bind(m.hashrate)
        .bind(m.temperature)
        .bind(m.power)
        .bind(m.fan_speed)
        .bind(&m.best_diff)
        .bind(m.shares_accepted)
        .bind(m.shares_rejected)
        .bind(m.frequency)
        .bind(m.voltage)
        .bind(m.core_voltage)
        .execute(&self.db)
        .await
        .map_err(|e| SinkError::Write(e.to_string()))?;

        Ok(())
    }

    async fn insert_pool_metric(&self, m: &PoolMetric) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pool_metrics (
                timestamp, pool_id, pool_name, pool_hashrate, pool_workers,
                network_hashrate, network_difficulty, last_block_time, blocks_found
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(m.timestamp)
        .bind(&m.pool_id)
        .bind(&m.pool_name)
        .bind(m.pool_hashrate)
        .bind(m.pool_workers)
        .bind(m.network_hashrate)
        .bind(m.network_difficulty)
        .bind(m.last_block_time)
        .bind(m.blocks_found)
        .execute(&self.db)
        .await
        .map_err(|e| SinkError::Write(e.to_string()))?;

        Ok(())
    }

    async fn insert_node_metric(&self, m: &NodeMetric) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO node_metrics (
                timestamp, node_id, node_name, block_height, connections,
                difficulty, network_hashrate
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(m.timestamp)
        .bind(&m.node_id)
        .bind(&m.node_name)
        .bind(m.block_height)
        .bind(m.connections)
        .bind(m.difficulty)
        .bind(m.network_hashrate)
        .execute(&self.db)
        .await
        .map_err(|e| SinkError::Write(e.to_string()))?;

        Ok(())
    }

    async fn query_device_metrics(
        &self,
        instance_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<DeviceMetric>> {
        sqlx::query_as::<_, DeviceMetric>(
            r#"
            SELECT timestamp, instance_id, instance_name, hashrate, temperature, power,
                   fan_speed, best_diff, shares_accepted, shares_rejected, frequency,
                   voltage, core_voltage
            FROM axeos_metrics
            WHERE instance_id = ? AND timestamp >= ? AND timestamp <= ?
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(instance_id)
        .bind(start)
        .bind(end)
        .bind(effective_limit(limit))
        .fetch_all(&self.db)
        .await
        .map_err(|e| SinkError::Query(e.to_string()))
    }

    async fn query_pool_metrics(
        &self,
        pool_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<PoolMetric>> {
        sqlx::query_as::<_, PoolMetric>(
            r#"
            SELECT timestamp, pool_id, pool_name, pool_hashrate, pool_workers,
                   network_hashrate, network_difficulty, last_block_time, blocks_found
            FROM pool_metrics
            WHERE pool_id = ? AND timestamp >= ? AND timestamp <= ?
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(pool_id)
        .bind(start)
        .bind(end)
        .bind(effective_limit(limit))
        .fetch_all(&self.db)
        .await
        .map_err(|e| SinkError::Query(e.to_string()))
    }

    async fn query_node_metrics(
        &self,
        node_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<NodeMetric>> {
        sqlx::query_as::<_, NodeMetric>(
            r#"
            SELECT timestamp, node_id, node_name, block_height, connections,
                   difficulty, network_hashrate
            FROM node_metrics
            WHERE node_id = ? AND timestamp >= ? AND timestamp <= ?
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(node_id)
        .bind(start)
        .bind(end)
        .bind(effective_limit(limit))
        .fetch_all(&self.db)
        .await
        .map_err(|e| SinkError::Query(e.to_string()))
    }

    async fn purge(&self, older_than_days: u32) -> Result<u64> {
        let Some(cutoff) = purge_cutoff(older_than_days) else {
            return Ok(0);
        };
        let mut removed = 0;

        for table in ["axeos_metrics", "pool_metrics", "node_metrics"] {
            let result = sqlx::query(&format!("DELETE FROM {} WHERE timestamp < ?", table))
                .bind(cutoff)
                .execute(&self.db)
                .await
                .map_err(|e| SinkError::Write(e.to_string()))?;
            removed += result.rows_affected();
        }

        tracing::info!(older_than_days, removed, "Purged expired metrics");
        Ok(removed)
    }
}
