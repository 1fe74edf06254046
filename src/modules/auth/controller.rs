use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::crud::{AccessCrud, AuthError};
use super::schema::{ErrorResponse, LoginRequest, LoginResponse, LogoutResponse};
use crate::AppState;

pub const SESSION_COOKIE: &str = "sessionToken";

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let settings = state.config.get();

    if settings.disable_authentication {
        return Ok((
            StatusCode::OK,
            Json(LoginResponse {
                success: true,
                message: "Authentication is disabled",
                expires_in: 0,
            }),
        )
            .into_response());
    }

    if req.username.is_empty() || req.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Username and password are required")),
        ));
    }

    let crud = AccessCrud::new(state.config.config_dir());
    crud.verify(&req.username, &req.password).await.map_err(|e| match e {
        AuthError::InvalidCredentials => {
            tracing::warn!(username = %req.username, "Rejected login");
            (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(e.to_string())))
        }
        _ => {
            tracing::error!(error = %e, "Login failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(e.to_string())))
        }
    })?;

    let token = state.jwt_service.create_token(&req.username).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(AuthError::Token(e.to_string()).to_string())),
        )
    })?;

    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        SESSION_COOKIE, token, settings.cookie_max_age
    );
    let cookie = HeaderValue::from_str(&cookie).map_err(|e| {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(e.to_string())))
    })?;

    tracing::info!(username = %req.username, "Login succeeded");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            message: "Login successful",
            expires_in: settings.cookie_max_age,
        }),
    )
        .into_response())
}

pub async fn logout() -> impl IntoResponse {
    let expired = format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0", SESSION_COOKIE);
    (
        StatusCode::OK,
        [(header::SET_COOKIE, expired)],
        Json(LogoutResponse {
            success: true,
            message: "Logged out",
        }),
    )
}

/// Value of the session cookie, if the request carries one.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}
