use axum::{routing::get, Router};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn page_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(controller::dashboard))
        .route("/index.html", get(controller::dashboard))
}
