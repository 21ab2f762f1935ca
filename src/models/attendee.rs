//! Attendance join rows.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One registration of a user for an event. The (user_id, event_id) pair is
/// unique; both sides cascade-delete.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub id: i32,
    pub user_id: i32,
    pub event_id: i32,
    pub created_at: DateTime<Utc>,
}
