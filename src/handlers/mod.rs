//! HTTP handlers: auth flow, event CRUD/queries, attendance.

pub mod attendance;
pub mod auth;
pub mod events;

use crate::error::AppError;
use serde_json::Value;

/// Parse a path id; non-numeric ids are a 400, not a 404.
pub(crate) fn parse_id(id_str: &str) -> Result<i32, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::BadRequest("invalid id".into()))
}

/// Deserialize a JSON body into a typed payload, mapping failures to a
/// validation error carrying serde's field-level message.
pub(crate) fn from_body<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::Validation(format!("invalid payload: {}", e)))
}
