use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use super::schema::{ActionResponse, InstanceQuery, StatisticsResponse};
use crate::config::{Peer, Settings};
use crate::modules::auth::schema::ErrorResponse;
use crate::services::remote::RemoteError;
use crate::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn resolve_device(settings: &Settings, query: &InstanceQuery) -> Result<Peer, ApiError> {
    let instance_id = query
        .instance_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Missing \"instanceId\" query parameter")),
            )
        })?;

    settings.find_device(instance_id).cloned().ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!(
                "Instance \"{}\" not found in configuration",
                instance_id
            ))),
        )
    })
}

fn remote_failure(peer: &Peer, e: RemoteError) -> ApiError {
    tracing::warn!(peer = %peer.name, error = %e, "Device request failed");
    let status = match &e {
        RemoteError::BadStatus { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::with_message("Device request failed", e.to_string())))
}

fn settings_locked(settings: &Settings) -> Result<(), ApiError> {
    if settings.disable_settings {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new("Settings are disabled by configuration")),
        ));
    }
    Ok(())
}

pub async fn instance_info(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InstanceQuery>,
) -> Result<Json<Value>, ApiError> {
    let settings = state.config.get();
    let peer = resolve_device(&settings, &query)?;
    let url = format!("{}{}", peer.url, settings.api_path("instanceInfo"));

    let payload = state
        .remote
        .get_json(&url)
        .await
        .map_err(|e| remote_failure(&peer, e))?;

    Ok(Json(payload))
}

pub async fn restart_instance(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InstanceQuery>,
) -> Result<Json<ActionResponse>, ApiError> {
    let settings = state.config.get();
    settings_locked(&settings)?;
    let peer = resolve_device(&settings, &query)?;
    let url = format!("{}{}", peer.url, settings.api_path("instanceRestart"));

    state
        .remote
        .post(&url, None)
        .await
        .map_err(|e| remote_failure(&peer, e))?;

    tracing::info!(peer = %peer.name, "Restart requested");
    Ok(Json(ActionResponse {
        success: true,
        message: format!("Restart initiated for {}", peer.name),
    }))
}

pub async fn update_instance_settings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InstanceQuery>,
    body: Bytes,
) -> Result<Json<ActionResponse>, ApiError> {
    let settings = state.config.get();
    settings_locked(&settings)?;
    let peer = resolve_device(&settings, &query)?;

    if body.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Request body cannot be empty")),
        ));
    }
    let body: Value = serde_json::from_slice(&body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_message("Invalid JSON in request body", e.to_string())),
        )
    })?;

    let url = format!("{}{}", peer.url, settings.api_path("instanceSettings"));
    state
        .remote
        .patch_json(&url, &body)
        .await
        .map_err(|e| remote_failure(&peer, e))?;

    tracing::info!(peer = %peer.name, "Device settings updated");
    Ok(Json(ActionResponse {
        success: true,
        message: format!("Settings updated for {}", peer.name),
    }))
}

pub async fn instance_statistics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InstanceQuery>,
) -> (StatusCode, Json<StatisticsResponse>) {
    let settings = state.config.get();
    let peer = match resolve_device(&settings, &query) {
        Ok(peer) => peer,
        Err((status, Json(err))) => {
            return (status, Json(StatisticsResponse::failure(query.instance_id.clone(), err.error)));
        }
    };

    let url = format!("{}{}", peer.url, settings.api_path("statisticsDashboard"));
    match state.remote.get_json(&url).await {
        Ok(data) => (
            StatusCode::OK,
            Json(StatisticsResponse {
                success: true,
                instance_id: Some(peer.name),
                instance_url: Some(peer.url),
                data: Some(data),
                message: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(peer = %peer.name, error = %e, "Statistics request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatisticsResponse::failure(
                    Some(peer.name.clone()),
                    format!("Failed to fetch statistics from {}: {}", peer.name, e),
                )),
            )
        }
    }
}
