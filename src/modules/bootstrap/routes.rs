use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use super::controller;
use crate::config::Environment;

/// Handler used while the setup files are missing.
pub fn bootstrap_routes(env: Arc<Environment>) -> Router {
    let public = ServeDir::new(&env.public_dir);
    Router::new()
        .route("/", get(controller::setup_page))
        .route("/bootstrap", post(controller::submit))
        .nest_service("/public", public)
        .with_state(env)
}
