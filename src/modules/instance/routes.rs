use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn instance_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/instance/info", get(controller::instance_info))
        .route("/api/instance/service/restart", post(controller::restart_instance))
        .route("/api/instance/service/settings", patch(controller::update_instance_settings))
        .route("/api/statistics", get(controller::instance_statistics))
}
