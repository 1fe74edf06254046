use axum::{routing::get, Router};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn configuration_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/configuration",
        get(controller::get_configuration).patch(controller::update_configuration),
    )
}
