//! Event CRUD and query handlers.

use crate::error::AppError;
use crate::handlers::{from_body, parse_id};
use crate::models::{Category, NewEvent, UpdateEvent};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

pub async fn list(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let events = state.storage.get_all_events().await?;
    Ok(Json(events))
}

/// `All` is a wildcard returning the full unfiltered listing.
pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let events = if category.eq_ignore_ascii_case("All") {
        state.storage.get_all_events().await?
    } else {
        let category: Category = category.parse()?;
        state.storage.get_events_by_category(category).await?
    };
    Ok(Json(events))
}

pub async fn near(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let lat = required_f64(&params, "lat")?;
    let lng = required_f64(&params, "lng")?;
    let distance = required_f64(&params, "distance")?;
    let events = state
        .storage
        .get_events_near_location(lat, lng, distance)
        .await?;
    Ok(Json(events))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let query = params
        .get("query")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("query parameter is required".into()))?;
    let events = state.storage.search_events(query).await?;
    Ok(Json(events))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let event = state
        .storage
        .get_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound("event".into()))?;
    Ok(Json(event))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let payload: NewEvent = from_body(body)?;
    payload.validate()?;
    let created = state.storage.create_event(payload).await?;
    let enriched = state
        .storage
        .get_event(created.id)
        .await?
        .ok_or_else(|| AppError::Internal("event missing right after create".into()))?;
    Ok((StatusCode::CREATED, Json(enriched)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let payload: UpdateEvent = from_body(body)?;
    payload.validate()?;
    state
        .storage
        .update_event(id, payload)
        .await?
        .ok_or_else(|| AppError::NotFound("event".into()))?;
    let enriched = state
        .storage
        .get_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound("event".into()))?;
    Ok(Json(enriched))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    if !state.storage.delete_event(id).await? {
        return Err(AppError::NotFound("event".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Raw attendee rows, no user enrichment. An unknown event id yields an
/// empty list rather than a 404.
pub async fn attendees(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let rows = state.storage.get_event_attendees(id).await?;
    Ok(Json(rows))
}

fn required_f64(params: &HashMap<String, String>, name: &str) -> Result<f64, AppError> {
    let raw = params.get(name).ok_or_else(|| {
        AppError::Validation("lat, lng and distance query parameters are required".into())
    })?;
    raw.parse()
        .map_err(|_| AppError::Validation(format!("{} must be a number", name)))
}
