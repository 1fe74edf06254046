use axum::{body::Bytes, extract::State, http::StatusCode, response::Response, Json};
use std::sync::Arc;
use validator::Validate;

use super::crud::{SetupWriter, JWT_KEY_LENGTH};
use super::schema::{BootstrapRequest, BootstrapResponse};
use crate::config::Environment;
use crate::modules::pages::controller::{render_page, DEFAULT_TITLE};

type ApiError = (StatusCode, Json<BootstrapResponse>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(BootstrapResponse::failure(message)))
}

pub async fn setup_page(State(env): State<Arc<Environment>>) -> Response {
    render_page(
        &env.public_dir.join("html").join("bootstrap.html"),
        DEFAULT_TITLE,
        env!("CARGO_PKG_VERSION"),
    )
    .await
}

/// Checks beyond the derived field rules. Returns the first failure message.
pub fn check_request(req: &BootstrapRequest) -> Result<(), String> {
    if let Err(e) = req.validate() {
        let message = e
            .field_errors()
            .values()
            .flat_map(|errors| errors.iter())
            .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| e.to_string());
        return Err(message);
    }

    if req.enable_auth {
        if req.username.is_empty() || req.password.is_empty() {
            return Err("Username and password are required when authentication is enabled".into());
        }
        if !req.confirm_password.is_empty() && req.confirm_password != req.password {
            return Err("Passwords do not match".into());
        }
        if req.jwt_key.chars().count() != JWT_KEY_LENGTH {
            return Err(format!("JWT key must be {} characters", JWT_KEY_LENGTH));
        }
    }

    if req.bitaxe_instances.is_empty() {
        return Err("At least one Bitaxe device is required".into());
    }

    Ok(())
}

/// Validate the setup form and write the first-run files.
pub async fn submit(
    State(env): State<Arc<Environment>>,
    body: Bytes,
) -> Result<Json<BootstrapResponse>, ApiError> {
    let req: BootstrapRequest =
        serde_json::from_slice(&body).map_err(|_| bad_request("Invalid request format"))?;

    check_request(&req).map_err(bad_request)?;

    SetupWriter::new(&env.config_dir).write(&req).await.map_err(|e| {
        tracing::error!(error = %e, "Setup failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(BootstrapResponse::failure(e.to_string())),
        )
    })?;

    Ok(Json(BootstrapResponse {
        success: true,
        message: "Configuration created successfully! Redirecting to dashboard...".into(),
    }))
}
