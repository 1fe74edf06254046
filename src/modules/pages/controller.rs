use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use chrono::Datelike;
use std::path::Path;
use std::sync::Arc;

use crate::AppState;

pub const DEFAULT_TITLE: &str = "AxeOS Dashboard";

/// Read an HTML page and fill the `<!-- TITLE -->`, `<!-- VERSION -->` and
/// `<!-- CURRENT_YEAR -->` placeholders.
pub async fn render_page(path: &Path, title: &str, version: &str) -> Response {
    let html = match tokio::fs::read_to_string(path).await {
        Ok(html) => html,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to read page");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Error</h1><p>Failed to load page</p>".to_string()),
            )
                .into_response();
        }
    };

    let year = chrono::Utc::now().year().to_string();
    let html = html
        .replace("<!-- TITLE -->", title)
        .replace("<!-- VERSION -->", version)
        .replace("<!-- CURRENT_YEAR -->", &year);

    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")],
        Html(html),
    )
        .into_response()
}

pub async fn dashboard(State(state): State<Arc<AppState>>) -> Response {
    let settings = state.config.get();
    let title = if settings.title.is_empty() {
        DEFAULT_TITLE
    } else {
        settings.title.as_str()
    };
    let version = settings.axeos_dashboard_version.to_string();

    render_page(
        &state.env.public_dir.join("html").join("dashboard.html"),
        title,
        &version,
    )
    .await
}
