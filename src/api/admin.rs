//! Admin API endpoints
//!
//! Handles HTTP requests for administration:
//! - GET /api/admin/users   - List all users
//! - GET /api/admin/entries - List all entries
//! - GET /api/admin/export  - Export users and entries as JSON
//!
//! All routes sit behind both the auth and the admin middleware.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{EntryResponse, UserResponse};

/// Response for the export endpoint
#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub export_date: String,
    pub users: Vec<UserResponse>,
    pub entries: Vec<EntryResponse>,
}

/// Build the admin router (mounted behind auth + admin middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/entries", get(list_all_entries))
        .route("/export", get(export_data))
}

/// GET /api/admin/users - List all users
async fn list_users(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state
        .user_repo
        .list()
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// GET /api/admin/entries - List every entry, newest date first
async fn list_all_entries(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<EntryResponse>>, ApiError> {
    // The admin middleware guarantees an unrestricted scope here
    let entries = state.entry_service.list_for(&user.0).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// GET /api/admin/export - Export all users and entries as JSON
async fn export_data(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ExportResponse>, ApiError> {
    let users = state
        .user_repo
        .list()
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;
    let entries = state.entry_service.list_for(&user.0).await?;

    Ok(Json(ExportResponse {
        export_date: Utc::now().to_rfc3339(),
        users: users.into_iter().map(Into::into).collect(),
        entries: entries.into_iter().map(Into::into).collect(),
    }))
}
