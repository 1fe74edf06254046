use axum::{routing::get, Router};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn systems_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/systems/info", get(controller::systems_info))
}
