pub mod config;
pub mod modules;
pub mod services;

use async_trait::async_trait;
use axum::{middleware, Router};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer};

use config::{init_db, ConfigStore, Environment};
use modules::auth::{auth_routes, require_session};
use modules::bootstrap::bootstrap_routes;
use modules::configuration::configuration_routes;
use modules::history::history_routes;
use modules::instance::instance_routes;
use modules::metrics::metrics_routes;
use modules::pages::page_routes;
use modules::systems::systems_routes;
use services::aggregator::FanOutOptions;
use services::gate::{BootError, ModeInitializer};
use services::jwt::JwtService;
use services::metrics::MetricsRegistry;
use services::remote::RemoteClient;
use services::scheduler::{CollectorContext, Scheduler};
use services::security::security_headers;
use services::sink::{MetricsSink, SqliteSink};

const MAX_BODY_BYTES: usize = 1024 * 100;

pub struct AppState {
    pub env: Arc<Environment>,
    pub config: Arc<ConfigStore>,
    pub remote: RemoteClient,
    pub jwt_service: JwtService,
    pub sink: Arc<dyn MetricsSink>,
    pub scheduler: Arc<Scheduler>,
    pub metrics: Arc<MetricsRegistry>,
    pub fanout: FanOutOptions,
}

impl AppState {
    /// Wire the shared handles. The scheduler is created stopped.
    pub fn new(
        env: Arc<Environment>,
        config: Arc<ConfigStore>,
        jwt_service: JwtService,
        sink: Arc<dyn MetricsSink>,
        metrics: Arc<MetricsRegistry>,
    ) -> Arc<Self> {
        let remote = RemoteClient::new(env.remote_timeout);
        let fanout = FanOutOptions {
            timeout: env.remote_timeout,
            max_concurrency: env.fanout_concurrency,
        };
        let scheduler = Arc::new(Scheduler::new(CollectorContext {
            config: config.clone(),
            remote: remote.clone(),
            sink: sink.clone(),
            metrics: metrics.clone(),
            options: fanout,
        }));

        Arc::new(Self {
            env,
            config,
            remote,
            jwt_service,
            sink,
            scheduler,
            metrics,
            fanout,
        })
    }
}

/// Full handler: dashboard, API, auth, metrics and static assets.
pub fn create_app(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .merge(page_routes())
        .merge(systems_routes())
        .merge(instance_routes())
        .merge(configuration_routes())
        .merge(history_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(protected)
        .merge(auth_routes(&state))
        .merge(metrics_routes())
        .nest_service("/public", ServeDir::new(&state.env.public_dir))
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Setup handler served until the first-run files exist.
pub fn create_bootstrap_app(env: Arc<Environment>) -> Router {
    bootstrap_routes(env)
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}

/// Builds the normal-mode handler from the files in the config directory.
///
/// Keeps the resulting state so the scheduler can be stopped on shutdown.
pub struct NormalModeInitializer {
    env: Arc<Environment>,
    config: Arc<ConfigStore>,
    metrics: Arc<MetricsRegistry>,
    state: OnceCell<Arc<AppState>>,
}

impl NormalModeInitializer {
    pub fn new(env: Arc<Environment>, config: Arc<ConfigStore>, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            env,
            config,
            metrics,
            state: OnceCell::new(),
        }
    }

    pub fn state(&self) -> Option<&Arc<AppState>> {
        self.state.get()
    }

    /// Stop background collection if normal mode was ever entered.
    pub async fn shutdown(&self) {
        if let Some(state) = self.state.get() {
            state.scheduler.stop().await;
        }
    }
}

#[async_trait]
impl ModeInitializer for NormalModeInitializer {
    async fn initialize(&self) -> Result<Router, BootError> {
        let jwt_service = JwtService::from_config_dir(&self.env.config_dir)
            .await
            .map_err(|e| BootError::Auth(e.to_string()))?;

        let settings = self
            .config
            .load()
            .await
            .map_err(|e| BootError::Config(e.to_string()))?;

        let db_path = self.env.metrics_db_path();
        let db = init_db(&db_path)
            .await
            .map_err(|e| BootError::Storage(format!("{}: {}", db_path.display(), e)))?;
        let sink = SqliteSink::new(db)
            .await
            .map_err(|e| BootError::Storage(e.to_string()))?;
        tracing::info!(path = %db_path.display(), "Metrics store ready");

        let state = AppState::new(
            self.env.clone(),
            self.config.clone(),
            jwt_service,
            Arc::new(sink),
            self.metrics.clone(),
        );

        if settings.data_collection_enabled {
            state
                .scheduler
                .start()
                .await
                .map_err(|e| BootError::Scheduler(e.to_string()))?;
        }

        if self.state.set(state.clone()).is_err() {
            tracing::warn!("Normal mode initialized more than once");
        }

        Ok(create_app(state))
    }
}
