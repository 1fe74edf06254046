use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::schema::{ConfigurationError, ConfigurationResponse};
use crate::config::ConfigError;
use crate::AppState;

type ApiError = (StatusCode, Json<ConfigurationError>);

/// Keys whose change alters which collection tasks exist or how often they run.
const COLLECTION_KEYS: [&str; 8] = [
    "data_collection_enabled",
    "collection_interval_seconds",
    "axeos_instances",
    "mining_core_enabled",
    "mining_core_url",
    "cryptNodesEnabled",
    "cryptoNodes",
    "data_retention_days",
];

fn ensure_enabled(state: &AppState) -> Result<(), ApiError> {
    if state.config.get().disable_configurations {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ConfigurationError::new("Configurations are disabled by configuration")),
        ));
    }
    Ok(())
}

pub async fn get_configuration(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ConfigurationResponse>, ApiError> {
    ensure_enabled(&state)?;

    Ok(Json(ConfigurationResponse {
        status: "success",
        message: None,
        data: state.config.get(),
    }))
}

/// Merge top-level keys into `config.json` and apply them without a restart.
pub async fn update_configuration(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ConfigurationResponse>, ApiError> {
    ensure_enabled(&state)?;

    if body.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ConfigurationError::new(
                "Request body is empty. Please provide configuration settings to update.",
            )),
        ));
    }

    let patch: Map<String, Value> = serde_json::from_slice(&body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ConfigurationError::new(format!("Invalid JSON in request body: {}", e))),
        )
    })?;

    let touches_collection = patch.keys().any(|k| COLLECTION_KEYS.contains(&k.as_str()));

    let updated = match state.config.merge(patch).await {
        Ok(updated) => {
            state.metrics.config_reloads_total.with_label_values(&["ok"]).inc();
            updated
        }
        Err(e) => {
            state.metrics.config_reloads_total.with_label_values(&["error"]).inc();
            tracing::error!(error = %e, "Configuration update rejected");
            let status = match e {
                ConfigError::Parse(_) => StatusCode::BAD_REQUEST,
                ConfigError::NotFound(_) | ConfigError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            return Err((status, Json(ConfigurationError::new(e.to_string()))));
        }
    };

    let mut message = "Configuration updated successfully! Changes have been applied immediately.".to_string();
    let collection_changed = touches_collection || updated.data_collection_enabled != state.scheduler.is_running();
    if collection_changed {
        if let Err(e) = state.scheduler.reconcile(&updated).await {
            tracing::error!(error = %e, "Failed to apply data collection settings");
            message = format!("Configuration saved, but data collection could not be updated: {}", e);
        }
    }

    Ok(Json(ConfigurationResponse {
        status: "success",
        message: Some(message),
        data: state.config.get(),
    }))
}
