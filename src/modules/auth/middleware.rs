use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use std::sync::Arc;

use super::controller::session_token;
use super::schema::ErrorResponse;
use crate::AppState;

/// Username of the authenticated caller, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct SessionUser(pub String);

/// Reject requests without a valid session. API calls get 401, pages redirect to the login form.
pub async fn require_session(State(state): State<Arc<AppState>>, mut request: Request, next: Next) -> Response {
    if state.config.get().disable_authentication {
        return next.run(request).await;
    }

    let claims = session_token(request.headers()).and_then(|token| state.jwt_service.verify_token(&token).ok());

    match claims {
        Some(data) => {
            request.extensions_mut().insert(SessionUser(data.claims.sub));
            next.run(request).await
        }
        None if request.uri().path().starts_with("/api/") => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Authentication required")),
        )
            .into_response(),
        None => Redirect::to("/login").into_response(),
    }
}
