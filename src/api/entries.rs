//! Delivery entry API endpoints
//!
//! Handles HTTP requests for entry management:
//! - GET    /api/entries      - List entries visible under the caller's scope
//! - POST   /api/entries      - Create a new entry
//! - GET    /api/entries/{id} - Get a single entry
//! - PUT    /api/entries/{id} - Partially update an entry
//! - DELETE /api/entries/{id} - Delete an entry
//!
//! All routes require authentication; ownership is stamped server-side.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::EntryResponse;
use crate::models::{CreateEntryInput, UpdateEntryInput};

/// Build the entries router (mounted behind the auth middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_entries))
        .route("/", post(create_entry))
        .route("/{id}", get(get_entry))
        .route("/{id}", put(update_entry))
        .route("/{id}", delete(delete_entry))
}

/// GET /api/entries - List entries, newest date first
///
/// Regular users see their own entries; admins see everything.
async fn list_entries(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<EntryResponse>>, ApiError> {
    let entries = state.entry_service.list_for(&user.0).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// POST /api/entries - Create a new entry
///
/// The owner is always the authenticated caller.
async fn create_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateEntryInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let entry = state.entry_service.create(&user.0, body).await?;
    Ok((StatusCode::CREATED, Json(EntryResponse::from(entry))))
}

/// GET /api/entries/{id} - Get a single entry
async fn get_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<EntryResponse>, ApiError> {
    let entry = state.entry_service.get(&user.0, id).await?;
    Ok(Json(entry.into()))
}

/// PUT /api/entries/{id} - Partially update an entry
async fn update_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateEntryInput>,
) -> Result<Json<EntryResponse>, ApiError> {
    let entry = state.entry_service.update(&user.0, id, body).await?;
    Ok(Json(entry.into()))
}

/// DELETE /api/entries/{id} - Delete an entry
async fn delete_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.entry_service.delete(&user.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
