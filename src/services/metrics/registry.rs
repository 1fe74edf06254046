use prometheus::{CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Process-wide Prometheus registry for collection and aggregation activity.
pub struct MetricsRegistry {
    registry: Registry,

    // Peer calls
    pub peer_requests_total: CounterVec,
    pub fanout_duration_seconds: HistogramVec,

    // Scheduler
    pub collection_runs_total: CounterVec,
    pub collection_duration_seconds: HistogramVec,
    pub scheduler_running: Gauge,

    // Storage
    pub sink_writes_total: CounterVec,
    pub metrics_purged_total: prometheus::Counter,

    // Runtime config
    pub config_reloads_total: CounterVec,
}

impl MetricsRegistry {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new_custom(Some("rig_dashboard".to_string()), None)?;

        let peer_requests_total = CounterVec::new(
            Opts::new("peer_requests_total", "Remote peer calls by class and outcome"),
            &["class", "outcome"],
        )?;
        registry.register(Box::new(peer_requests_total.clone()))?;

        let fanout_duration_seconds = HistogramVec::new(
            HistogramOpts::new("peer_fanout_duration_seconds", "Wall time of one fan-out round")
                .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["class"],
        )?;
        registry.register(Box::new(fanout_duration_seconds.clone()))?;

        let collection_runs_total = CounterVec::new(
            Opts::new("collection_runs_total", "Scheduled collection ticks by task"),
            &["task"],
        )?;
        registry.register(Box::new(collection_runs_total.clone()))?;

        let collection_duration_seconds = HistogramVec::new(
            HistogramOpts::new("collection_duration_seconds", "Duration of one collection tick")
                .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
            &["task"],
        )?;
        registry.register(Box::new(collection_duration_seconds.clone()))?;

        let scheduler_running = Gauge::new("scheduler_running", "1 while periodic collection is running")?;
        registry.register(Box::new(scheduler_running.clone()))?;

        let sink_writes_total = CounterVec::new(
            Opts::new("sink_writes_total", "Metric inserts by record kind and result"),
            &["kind", "result"],
        )?;
        registry.register(Box::new(sink_writes_total.clone()))?;

        let metrics_purged_total = prometheus::Counter::new("metrics_purged_total", "Records removed by retention purges")?;
        registry.register(Box::new(metrics_purged_total.clone()))?;

        let config_reloads_total = CounterVec::new(
            Opts::new("config_reloads_total", "Configuration reloads by result"),
            &["result"],
        )?;
        registry.register(Box::new(config_reloads_total.clone()))?;

        Ok(Arc::new(Self {
            registry,
            peer_requests_total,
            fanout_duration_seconds,
            collection_runs_total,
            collection_duration_seconds,
            scheduler_running,
            sink_writes_total,
            metrics_purged_total,
            config_reloads_total,
        }))
    }

    /// Count the outcomes of one fan-out round.
    pub fn record_outcomes(&self, class: &str, results: impl IntoIterator<Item = bool>) {
        for ok in results {
            let outcome = if ok { "ok" } else { "error" };
            self.peer_requests_total.with_label_values(&[class, outcome]).inc();
        }
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
