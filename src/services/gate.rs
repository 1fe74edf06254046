use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

use crate::config::ConfigStore;
use crate::modules::auth::schema::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum BootError {
    #[error("Authentication setup failed: {0}")]
    Auth(String),

    #[error("Configuration unavailable: {0}")]
    Config(String),

    #[error("Metrics store unavailable: {0}")]
    Storage(String),

    #[error("Collection scheduler failed: {0}")]
    Scheduler(String),
}

/// Builds the full request handler once setup files exist.
#[async_trait]
pub trait ModeInitializer: Send + Sync {
    async fn initialize(&self) -> Result<Router, BootError>;
}

pub enum ServerMode {
    Bootstrap(Router),
    Normal(Router),
}

/// Routes every request to either the setup handler or the full handler.
///
/// The transition to `Normal` happens at most once and never reverses. It runs
/// under the write lock after re-checking the mode, so concurrent requests
/// wait for the single initialization instead of repeating it.
pub struct BootGate {
    mode: RwLock<ServerMode>,
    config: Arc<ConfigStore>,
    initializer: Arc<dyn ModeInitializer>,
}

impl BootGate {
    pub fn new(mode: ServerMode, config: Arc<ConfigStore>, initializer: Arc<dyn ModeInitializer>) -> Self {
        Self {
            mode: RwLock::new(mode),
            config,
            initializer,
        }
    }

    pub async fn is_normal(&self) -> bool {
        matches!(*self.mode.read().await, ServerMode::Normal(_))
    }

    pub async fn handle(&self, request: Request) -> Response {
        let router = match self.select_router().await {
            Ok(router) => router,
            Err(e) => {
                tracing::error!(error = %e, "Initialization failed, staying in bootstrap mode");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::with_message("Server initialization failed", e.to_string())),
                )
                    .into_response();
            }
        };

        match router.oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }

    async fn select_router(&self) -> Result<Router, BootError> {
        {
            let mode = self.mode.read().await;
            match &*mode {
                ServerMode::Normal(router) => return Ok(router.clone()),
                ServerMode::Bootstrap(router) if !self.config.required_artifacts_exist() => {
                    return Ok(router.clone());
                }
                ServerMode::Bootstrap(_) => {}
            }
        }

        let mut mode = self.mode.write().await;
        if let ServerMode::Normal(router) = &*mode {
            return Ok(router.clone());
        }

        let router = self.initializer.initialize().await?;
        *mode = ServerMode::Normal(router.clone());
        tracing::info!("Setup files detected, switched to normal mode");

        Ok(router)
    }

    /// Single catch-all router that dispatches through the gate.
    pub fn into_router(self: Arc<Self>) -> Router {
        Router::new().fallback(dispatch).with_state(self)
    }
}

async fn dispatch(State(gate): State<Arc<BootGate>>, request: Request) -> Response {
    gate.handle(request).await
}
