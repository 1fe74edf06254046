use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use super::schema::{
    CollectionStatusResponse, HistoryQuery, HistoryRecords, HistoryResponse, MetricKind, PurgeResponse,
};
use crate::modules::auth::schema::ErrorResponse;
use crate::services::scheduler::effective_interval;
use crate::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

const DEFAULT_WINDOW_HOURS: i64 = 24;

pub async fn metrics_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    if query.id.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::new("id is required"))));
    }

    let end = query.end.unwrap_or_else(Utc::now);
    let start = query
        .start
        .unwrap_or_else(|| end - chrono::Duration::hours(DEFAULT_WINDOW_HOURS));
    if start > end {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("start must not be after end")),
        ));
    }

    let sink = &state.sink;
    let id = query.id.as_str();
    let records = match query.kind {
        MetricKind::Device => sink
            .query_device_metrics(id, start, end, query.limit)
            .await
            .map(HistoryRecords::Device),
        MetricKind::Pool => sink
            .query_pool_metrics(id, start, end, query.limit)
            .await
            .map(HistoryRecords::Pool),
        MetricKind::Node => sink
            .query_node_metrics(id, start, end, query.limit)
            .await
            .map(HistoryRecords::Node),
    }
    .map_err(|e| {
        tracing::error!(error = %e, kind = ?query.kind, id, "History query failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::with_message("Failed to query metrics", e.to_string())),
        )
    })?;

    Ok(Json(HistoryResponse {
        status: "success",
        count: records.len(),
        data: records,
    }))
}

/// Operator-triggered retention cleanup.
pub async fn purge_metrics(State(state): State<Arc<AppState>>) -> Result<Json<PurgeResponse>, ApiError> {
    let removed = state.scheduler.purge_expired().await.map_err(|e| {
        tracing::error!(error = %e, "Purge failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::with_message("Failed to purge metrics", e.to_string())),
        )
    })?;

    let retention_days = state.config.get().data_retention_days;
    tracing::info!(removed, retention_days, "Expired metrics purged");

    Ok(Json(PurgeResponse {
        status: "success",
        removed,
        retention_days,
    }))
}

pub async fn collection_status(State(state): State<Arc<AppState>>) -> Json<CollectionStatusResponse> {
    let settings = state.config.get();
    let tasks = state.scheduler.running_tasks().await.unwrap_or_default();

    Json(CollectionStatusResponse {
        enabled: settings.data_collection_enabled,
        running: state.scheduler.is_running(),
        tasks,
        interval_seconds: effective_interval(settings.collection_interval_seconds).as_secs(),
        retention_days: settings.data_retention_days,
    })
}
