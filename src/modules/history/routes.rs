use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn history_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/metrics/history", get(controller::metrics_history))
        .route("/api/metrics/purge", post(controller::purge_metrics))
        .route("/api/collection/status", get(controller::collection_status))
}
