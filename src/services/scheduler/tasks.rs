use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigStore, NodePeer, RpcDirectory};
use crate::services::aggregator::devices::fetch_device_info;
use crate::services::aggregator::nodes::fetch_node_status;
use crate::services::aggregator::pools::fetch_pools;
use crate::services::aggregator::{fan_out, FanOutOptions};
use crate::services::metrics::MetricsRegistry;
use crate::services::remote::RemoteClient;
use crate::services::sink::{DeviceMetric, MetricsSink, NodeMetric, PoolMetric, SinkError};

/// Everything a collector needs. Cloned into each task.
#[derive(Clone)]
pub struct CollectorContext {
    pub config: Arc<ConfigStore>,
    pub remote: RemoteClient,
    pub sink: Arc<dyn MetricsSink>,
    pub metrics: Arc<MetricsRegistry>,
    pub options: FanOutOptions,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollectionReport {
    pub stored: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// One kind of periodic collection. Reads the current snapshot on every run.
#[async_trait]
pub trait Collector: Send + Sync {
    fn name(&self) -> &'static str;
    async fn collect(&self, cancel: &CancellationToken) -> CollectionReport;
}

impl CollectorContext {
    fn record_write(&self, kind: &str, result: &Result<(), SinkError>, peer: &str, report: &mut CollectionReport) {
        match result {
            Ok(()) => {
                report.stored += 1;
                self.metrics.sink_writes_total.with_label_values(&[kind, "ok"]).inc();
            }
            Err(e) => {
                report.failed += 1;
                self.metrics.sink_writes_total.with_label_values(&[kind, "error"]).inc();
                tracing::error!(peer, kind, error = %e, "Failed to store metric");
            }
        }
    }
}

// =============================================================================
// DEVICES
// =============================================================================

pub struct DeviceCollector {
    ctx: CollectorContext,
}

impl DeviceCollector {
    pub fn new(ctx: CollectorContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Collector for DeviceCollector {
    fn name(&self) -> &'static str {
        "device_metrics"
    }

    async fn collect(&self, cancel: &CancellationToken) -> CollectionReport {
        let settings = self.ctx.config.get();
        let outcomes = fetch_device_info(&self.ctx.remote, &settings, self.ctx.options).await;
        self.ctx.metrics.record_outcomes("device", outcomes.iter().map(|o| o.is_ok()));

        let now = Utc::now();
        let mut report = CollectionReport::default();

        for outcome in outcomes {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            match outcome.result {
                Ok(payload) => {
                    let metric = DeviceMetric::from_payload(&outcome.peer, &Value::Object(payload), now);
                    let result = self.ctx.sink.insert_device_metric(&metric).await;
                    self.ctx.record_write("device", &result, &outcome.peer, &mut report);
                }
                Err(failure) => {
                    report.failed += 1;
                    tracing::warn!(peer = %outcome.peer, error = %failure, "Device collection failed");
                }
            }
        }

        report
    }
}

// =============================================================================
// POOLS
// =============================================================================

pub struct PoolCollector {
    ctx: CollectorContext,
}

impl PoolCollector {
    pub fn new(ctx: CollectorContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Collector for PoolCollector {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    async fn collect(&self, cancel: &CancellationToken) -> CollectionReport {
        let settings = self.ctx.config.get();
        let outcomes = fetch_pools(&self.ctx.remote, &settings, self.ctx.options).await;
        self.ctx.metrics.record_outcomes("pool", outcomes.iter().map(|o| o.is_ok()));

        let now = Utc::now();
        let mut report = CollectionReport::default();

        for outcome in outcomes {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            match outcome.result {
                Ok(payload) => {
                    for metric in PoolMetric::from_payload(&outcome.peer, &payload, now) {
                        let result = self.ctx.sink.insert_pool_metric(&metric).await;
                        self.ctx.record_write("pool", &result, &outcome.peer, &mut report);
                    }
                }
                Err(failure) => {
                    report.failed += 1;
                    tracing::warn!(peer = %outcome.peer, error = %failure, "Pool collection failed");
                }
            }
        }

        report
    }
}

// =============================================================================
// NODES
// =============================================================================

pub struct NodeCollector {
    ctx: CollectorContext,
}

impl NodeCollector {
    pub fn new(ctx: CollectorContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Collector for NodeCollector {
    fn name(&self) -> &'static str {
        "node_metrics"
    }

    async fn collect(&self, cancel: &CancellationToken) -> CollectionReport {
        let settings = self.ctx.config.get();
        let mut report = CollectionReport::default();

        if !settings.crypt_nodes_enabled || settings.node_peers().is_empty() {
            return report;
        }

        let directory = match RpcDirectory::load(self.ctx.config.config_dir()).await {
            Ok(directory) => Arc::new(directory),
            Err(e) => {
                tracing::error!(error = %e, "Cannot read node RPC configuration");
                report.failed = settings.node_peers().len();
                return report;
            }
        };

        let remote = self.ctx.remote.clone();
        let outcomes = fan_out(settings.node_peers().to_vec(), self.ctx.options, move |node: NodePeer| {
            let remote = remote.clone();
            let directory = directory.clone();
            async move { fetch_node_status(&remote, &directory, &node.id).await }
        })
        .await;
        self.ctx.metrics.record_outcomes("node", outcomes.iter().map(|o| o.is_ok()));

        let now = Utc::now();
        for outcome in outcomes {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            match outcome.result {
                Ok((blockchain_info, network_info)) => {
                    let name = settings
                        .node_peers()
                        .iter()
                        .find(|n| n.id == outcome.peer)
                        .map(|n| n.display_name().to_string())
                        .unwrap_or_else(|| outcome.peer.clone());
                    let metric = NodeMetric::from_rpc(&outcome.peer, &name, &blockchain_info, &network_info, now);
                    let result = self.ctx.sink.insert_node_metric(&metric).await;
                    self.ctx.record_write("node", &result, &outcome.peer, &mut report);
                }
                Err(failure) => {
                    report.failed += 1;
                    tracing::warn!(node = %outcome.peer, error = %failure, "Node collection failed");
                }
            }
        }

        report
    }
}
