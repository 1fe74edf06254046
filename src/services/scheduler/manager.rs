use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::tasks::{Collector, CollectorContext, DeviceCollector, NodeCollector, PoolCollector};
use crate::config::settings::DEFAULT_COLLECTION_INTERVAL_SECS;
use crate::config::{ConfigError, Settings};
use crate::services::sink::SinkError;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Scheduler is already running")]
    AlreadyRunning,

    #[error("Scheduler is not running")]
    NotRunning,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// 0 or unset means the default; anything else is clamped to at least one second.
pub fn effective_interval(seconds: u64) -> Duration {
    if seconds == 0 {
        Duration::from_secs(DEFAULT_COLLECTION_INTERVAL_SECS)
    } else {
        Duration::from_secs(seconds.max(1))
    }
}

/// A named periodic job. Lives for one Running period.
pub struct Task {
    pub name: &'static str,
    pub interval: Duration,
    collector: Arc<dyn Collector>,
}

impl Task {
    pub fn new(interval: Duration, collector: Arc<dyn Collector>) -> Self {
        Self {
            name: collector.name(),
            interval,
            collector,
        }
    }
}

struct Running {
    cancel: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

/// Runs one async task per enabled collector, each on its own timer.
///
/// `start` and `stop` are serialized; `stop` returns once every task has exited.
pub struct Scheduler {
    ctx: CollectorContext,
    state: Mutex<Option<Running>>,
    running: AtomicBool,
}

impl Scheduler {
    pub fn new(ctx: CollectorContext) -> Self {
        Self {
            ctx,
            state: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Reload configuration and launch a task per enabled, non-empty peer class.
    pub async fn start(&self) -> Result<Vec<&'static str>, SchedulerError> {
        let mut state = self.state.lock().await;
        if state.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let settings = self.ctx.config.load().await?;
        let tasks = self.plan(&settings);
        if tasks.is_empty() {
            tracing::warn!("Data collection enabled but no peers are configured");
        }

        let cancel = CancellationToken::new();
        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let name = task.name;
                let handle = tokio::spawn(run_task(task, cancel.clone(), self.ctx.clone()));
                (name, handle)
            })
            .collect();

        let names: Vec<&'static str> = handles.iter().map(|(name, _)| *name).collect();
        *state = Some(Running { cancel, handles });
        self.running.store(true, Ordering::SeqCst);
        self.ctx.metrics.scheduler_running.set(1.0);

        tracing::info!(
            tasks = ?names,
            interval_secs = effective_interval(settings.collection_interval_seconds).as_secs(),
            "Scheduler started"
        );
        Ok(names)
    }

    /// Cancel every task and wait for in-flight runs to finish. No-op when stopped.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        let Some(running) = state.take() else {
            return;
        };

        running.cancel.cancel();
        for (name, handle) in running.handles {
            if let Err(e) = handle.await {
                tracing::error!(task = name, error = %e, "Collection task ended abnormally");
            }
        }

        self.running.store(false, Ordering::SeqCst);
        self.ctx.metrics.scheduler_running.set(0.0);
        tracing::info!("Scheduler stopped");
    }

    pub async fn running_tasks(&self) -> Result<Vec<&'static str>, SchedulerError> {
        let state = self.state.lock().await;
        match state.as_ref() {
            Some(running) => Ok(running.handles.iter().map(|(name, _)| *name).collect()),
            None => Err(SchedulerError::NotRunning),
        }
    }

    /// Bring the scheduler in line with `data_collection_enabled` after a config change.
    /// A running scheduler is restarted so new peers and intervals take effect.
    pub async fn reconcile(&self, settings: &Settings) -> Result<(), SchedulerError> {
        self.stop().await;
        if settings.data_collection_enabled {
            self.start().await?;
        }
        Ok(())
    }

    /// Delete records older than the configured retention window.
    pub async fn purge_expired(&self) -> Result<u64, SchedulerError> {
        let days = self.ctx.config.get().data_retention_days;
        let removed = self.ctx.sink.purge(days).await?;
        self.ctx.metrics.metrics_purged_total.inc_by(removed as f64);
        Ok(removed)
    }

    fn plan(&self, settings: &Settings) -> Vec<Task> {
        let interval = effective_interval(settings.collection_interval_seconds);
        let mut tasks = Vec::new();

        if !settings.device_peers().is_empty() {
            tasks.push(Task::new(interval, Arc::new(DeviceCollector::new(self.ctx.clone()))));
        }
        if settings.mining_core_enabled && !settings.pool_peers().is_empty() {
            tasks.push(Task::new(interval, Arc::new(PoolCollector::new(self.ctx.clone()))));
        }
        if settings.crypt_nodes_enabled && !settings.node_peers().is_empty() {
            tasks.push(Task::new(interval, Arc::new(NodeCollector::new(self.ctx.clone()))));
        }

        tasks
    }
}

/// First run happens immediately, then once per interval. Ticks of one task never overlap.
async fn run_task(task: Task, cancel: CancellationToken, ctx: CollectorContext) {
    let mut ticker = tokio::time::interval(task.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let started = Instant::now();
                let report = task.collector.collect(&cancel).await;

                ctx.metrics.collection_runs_total.with_label_values(&[task.name]).inc();
                ctx.metrics
                    .collection_duration_seconds
                    .with_label_values(&[task.name])
                    .observe(started.elapsed().as_secs_f64());

                tracing::info!(
                    task = task.name,
                    stored = report.stored,
                    failed = report.failed,
                    cancelled = report.cancelled,
                    "Collection run finished"
                );
            }
        }
    }

    tracing::debug!(task = task.name, "Collection task exited");
}
