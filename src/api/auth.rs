//! Authentication API endpoints
//!
//! Handles HTTP requests for session management:
//! - POST /api/auth/session - Exchange an external assertion for a session
//! - GET  /api/auth/me      - Get current user
//! - POST /api/auth/logout  - Invalidate the current session
//!
//! The external assertion arrives in the `X-Session-ID` header, exactly as
//! the identity provider's redirect flow delivers it. The internal token is
//! returned in the body and mirrored into an HttpOnly cookie.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::UserResponse;

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new().route("/session", post(create_session))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_current_user))
        .route("/logout", post(logout))
}

/// POST /api/auth/session - Exchange an external assertion for a session
///
/// The assertion is single-use and short-lived; the returned token is
/// long-lived with an absolute expiry.
async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let assertion = headers
        .get("x-session-id")
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation_error("Session ID required in X-Session-ID header"))?;

    let (session, user) = state.auth_service.create_session(assertion).await?;

    // Mirror the token into an HttpOnly cookie for browser clients
    let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.id, max_age
    );

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::internal_error(e.to_string()))?,
    );

    Ok((
        StatusCode::CREATED,
        response_headers,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// GET /api/auth/me - Get current user
///
/// Requires authentication.
async fn get_current_user(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(user.0.into())
}

/// POST /api/auth/logout - Invalidate the current session
///
/// Requires authentication. Idempotent: logging out an already-deleted
/// token succeeds.
async fn logout(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    // Extract token from cookie or Authorization header
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .or_else(|| {
            headers
                .get(header::COOKIE)
                .and_then(|h| h.to_str().ok())
                .and_then(|s| {
                    s.split(';')
                        .map(|c| c.trim())
                        .find_map(|c| c.strip_prefix("session="))
                })
        })
        .ok_or_else(|| ApiError::unauthenticated("Missing authentication token"))?;

    state.auth_service.logout(token).await?;

    // Clear the session cookie
    let clear_cookie = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";
    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, HeaderValue::from_static(clear_cookie));

    Ok((StatusCode::NO_CONTENT, response_headers))
}
