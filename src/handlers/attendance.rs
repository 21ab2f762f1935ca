//! Attendance registration; both endpoints require a session.

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::handlers::parse_id;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

pub async fn attend(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    user: CurrentUser,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let event_id = parse_id(&id_str)?;
    state
        .storage
        .get_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("event".into()))?;
    if state.storage.is_user_attending(user.user.id, event_id).await? {
        return Err(AppError::Conflict("already registered for this event".into()));
    }
    state.storage.create_attendee(user.user.id, event_id).await?;
    tracing::info!(user_id = user.user.id, event_id, "attendance registered");
    let refreshed = state
        .storage
        .get_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("event".into()))?;
    Ok((StatusCode::CREATED, Json(refreshed)))
}

pub async fn unattend(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    user: CurrentUser,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let event_id = parse_id(&id_str)?;
    state
        .storage
        .get_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("event".into()))?;
    if !state.storage.is_user_attending(user.user.id, event_id).await? {
        return Err(AppError::BadRequest("not registered for this event".into()));
    }
    state.storage.delete_attendee(user.user.id, event_id).await?;
    tracing::info!(user_id = user.user.id, event_id, "attendance removed");
    let refreshed = state
        .storage
        .get_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("event".into()))?;
    Ok(Json(refreshed))
}
