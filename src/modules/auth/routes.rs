use axum::{
    routing::{any, get_service, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeFile;

use super::controller;
use crate::AppState;

pub fn auth_routes(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/login", post(controller::login))
        .route("/api/logout", any(controller::logout))
        .route(
            "/login",
            get_service(ServeFile::new(state.env.public_dir.join("html").join("login.html"))),
        )
}
